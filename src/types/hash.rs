//! 20-byte script hashes identifying deployed scripts.

use sha3::{Digest, Sha3_256};
use std::fmt;

/// Script hash length in bytes.
pub const SCRIPT_HASH_LEN: usize = 20;

/// Identifier of a script, derived from its bytecode.
///
/// Stored in little-endian (wire) order. The human-readable form printed by
/// `Display` is the byte-reversed hex string prefixed with `0x`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptHash(pub [u8; SCRIPT_HASH_LEN]);

impl ScriptHash {
    /// Hashes a script: SHA3-256 of the bytecode, keeping the last 20 bytes.
    pub fn of(script: &[u8]) -> Self {
        let digest = Sha3_256::digest(script);
        let mut out = [0u8; SCRIPT_HASH_LEN];
        out.copy_from_slice(&digest[digest.len() - SCRIPT_HASH_LEN..]);
        Self(out)
    }

    pub fn zero() -> Self {
        Self([0u8; SCRIPT_HASH_LEN])
    }

    /// Builds a hash from a slice, returning `None` unless it is exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; SCRIPT_HASH_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the bytes in big-endian (display) order.
    pub fn reversed(&self) -> [u8; SCRIPT_HASH_LEN] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.reversed()))
    }
}
