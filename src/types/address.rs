//! Conversion from human-readable addresses to script hashes.
//!
//! The chain's real address format is owned by the host; the registry only needs
//! something that maps an address string to a [`ScriptHash`].

use crate::types::hash::{SCRIPT_HASH_LEN, ScriptHash};
use vm_interop_derive::Error;

/// Errors produced while decoding an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The address is not valid hexadecimal.
    #[error("address {0} is not valid hex")]
    InvalidHex(String),
    /// The decoded address has the wrong length.
    #[error("address decodes to {actual} bytes, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Maps an address string to the script hash it designates.
pub trait AddressCodec {
    fn to_script_hash(&self, address: &str) -> Result<ScriptHash, AddressError>;
}

/// Address codec for the `0x`-prefixed big-endian hex form printed by
/// [`ScriptHash`]'s `Display` impl. The prefix is optional.
#[derive(Clone, Copy, Debug, Default)]
pub struct HexAddressCodec;

impl AddressCodec for HexAddressCodec {
    fn to_script_hash(&self, address: &str) -> Result<ScriptHash, AddressError> {
        let digits = address.strip_prefix("0x").unwrap_or(address);
        let raw =
            hex::decode(digits).map_err(|_| AddressError::InvalidHex(address.to_string()))?;
        let mut bytes: [u8; SCRIPT_HASH_LEN] =
            raw.as_slice().try_into().map_err(|_| AddressError::InvalidLength {
                expected: SCRIPT_HASH_LEN,
                actual: raw.len(),
            })?;
        bytes.reverse();
        Ok(ScriptHash(bytes))
    }
}
