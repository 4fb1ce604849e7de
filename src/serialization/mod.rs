//! Binary serialization of stack items.
//!
//! # Wire format
//!
//! Every node starts with one type tag byte ([`StackItemType`]):
//!
//! - `ByteArray`: var-bytes payload
//! - `Boolean`: one byte, `0` or `1`
//! - `Integer`: var-bytes of the minimal little-endian two's-complement value
//! - `Array` / `Struct`: var-int element count, then the elements in order
//! - `Map`: var-int entry count, then `key, value` per entry in insertion order
//!
//! Var-ints use the compact prefix form: values below `0xFD` take one byte, larger
//! ones are `0xFD` + u16, `0xFE` + u32 or `0xFF` + u64, all little-endian.
//!
//! Both directions run on explicit work stacks, so nesting depth in the input never
//! translates into native call-stack depth.

mod deserializer;
mod errors;
mod serializer;
mod wire;

pub use deserializer::deserialize;
pub use errors::{DeserializeError, FormatError, SerializeError};
pub use serializer::serialize;

/// Type tags of serialized stack items.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackItemType {
    ByteArray = 0x00,
    Boolean = 0x01,
    Integer = 0x02,
    /// Reserved for host references; never written and rejected when read.
    Interop = 0x40,
    Array = 0x80,
    Struct = 0x81,
    Map = 0x82,
}

impl TryFrom<u8> for StackItemType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x00 => Ok(StackItemType::ByteArray),
            0x01 => Ok(StackItemType::Boolean),
            0x02 => Ok(StackItemType::Integer),
            0x40 => Ok(StackItemType::Interop),
            0x80 => Ok(StackItemType::Array),
            0x81 => Ok(StackItemType::Struct),
            0x82 => Ok(StackItemType::Map),
            other => Err(other),
        }
    }
}
