//! Primitive types shared by the interop layer.
//!
//! - [`bytes::Bytes`]: immutable, cheaply cloned byte sequence backing `ByteArray` items
//! - [`hash::ScriptHash`]: 20-byte script identifier
//! - [`address::AddressCodec`]: pluggable address to script hash conversion

pub mod address;
pub mod bytes;
pub mod hash;
