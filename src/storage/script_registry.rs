//! Script lookup by hash.
//!
//! [`ScriptRegistry`] maps script hashes to bytecode so the engine can resolve the
//! scripts it is asked to load. Entries are keyed by the lowercase hex of the
//! byte-reversed hash, matching the key format used by external tooling.

use crate::debug;
use crate::types::address::{AddressCodec, AddressError, HexAddressCodec};
use crate::types::bytes::Bytes;
use crate::types::hash::ScriptHash;
use std::collections::BTreeMap;
use vm_interop_derive::Error;

/// Errors raised by the script registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptRegistryError {
    /// A script is already registered under this key.
    #[error("script {key} is already registered")]
    DuplicateScript { key: String },
    /// No script is registered under this key.
    #[error("script {key} not found")]
    MissingScript { key: String },
    /// The address could not be turned into a script hash.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
}

/// Read access to scripts by hash, as consumed by the engine.
pub trait ScriptTable {
    /// Returns the script whose hash is `script_hash` (wire byte order), if known.
    fn get_script(&self, script_hash: &[u8]) -> Option<Bytes>;
}

/// Where a script is registered: under an address or directly under its hash.
#[derive(Clone, Copy, Debug)]
pub enum ScriptLocator<'a> {
    Address(&'a str),
    Hash(ScriptHash),
}

impl<'a> From<&'a str> for ScriptLocator<'a> {
    fn from(address: &'a str) -> Self {
        ScriptLocator::Address(address)
    }
}

impl From<ScriptHash> for ScriptLocator<'_> {
    fn from(hash: ScriptHash) -> Self {
        ScriptLocator::Hash(hash)
    }
}

/// Returns the registry key for a hash: lowercase hex of the reversed bytes.
pub fn registry_key(script_hash: &[u8]) -> String {
    let reversed: Vec<u8> = script_hash.iter().rev().copied().collect();
    hex::encode(reversed)
}

/// Insert-once map from script hash to bytecode.
#[derive(Debug, Default)]
pub struct ScriptRegistry<C: AddressCodec = HexAddressCodec> {
    codec: C,
    scripts: BTreeMap<String, Bytes>,
}

impl ScriptRegistry {
    /// Creates an empty registry that reads addresses in `0x`-hex form.
    pub fn new() -> Self {
        Self::with_codec(HexAddressCodec)
    }
}

impl<C: AddressCodec> ScriptRegistry<C> {
    /// Creates an empty registry that resolves addresses with `codec`.
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            scripts: BTreeMap::new(),
        }
    }

    /// Registers `script` and returns the hash it was stored under.
    ///
    /// Fails with [`ScriptRegistryError::DuplicateScript`] instead of overwriting.
    pub fn add<'a>(
        &mut self,
        locator: impl Into<ScriptLocator<'a>>,
        script: impl Into<Bytes>,
    ) -> Result<ScriptHash, ScriptRegistryError> {
        let hash = match locator.into() {
            ScriptLocator::Address(address) => self.codec.to_script_hash(address)?,
            ScriptLocator::Hash(hash) => hash,
        };
        let key = registry_key(hash.as_slice());
        if self.scripts.contains_key(&key) {
            return Err(ScriptRegistryError::DuplicateScript { key });
        }
        debug!("registered script {hash}");
        self.scripts.insert(key, script.into());
        Ok(hash)
    }

    /// Returns the script registered under `script_hash` (wire byte order).
    pub fn get(&self, script_hash: &[u8]) -> Result<Bytes, ScriptRegistryError> {
        let key = registry_key(script_hash);
        match self.scripts.get(&key) {
            Some(script) => Ok(script.clone()),
            None => Err(ScriptRegistryError::MissingScript { key }),
        }
    }

    pub fn contains(&self, script_hash: &[u8]) -> bool {
        self.scripts.contains_key(&registry_key(script_hash))
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Iterates over `(key, script)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.scripts.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<C: AddressCodec> ScriptTable for ScriptRegistry<C> {
    fn get_script(&self, script_hash: &[u8]) -> Option<Bytes> {
        self.get(script_hash).ok()
    }
}
