//! Runtime value model of the evaluation stack.
//!
//! Primitive items (`ByteArray`, `Boolean`, `Integer`) are stored inline. Containers
//! (`Array`, `Struct`, `Map`) are handles into a [`ValueHeap`](super::heap::ValueHeap);
//! two items holding the same handle alias the same container.

use crate::types::bytes::Bytes;
use num_bigint::BigInt;
use num_traits::Zero;

/// Handle to an element sequence in a value heap (used by arrays and structs).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayRef(pub(crate) u32);

/// Handle to a map in a value heap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapRef(pub(crate) u32);

/// Opaque handle to a host-owned object, such as the script container.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostRef(pub u64);

/// A value on the evaluation stack.
///
/// Equality is shallow: containers compare by handle (identity), not by content.
/// Use [`ValueHeap::structural_eq`](super::heap::ValueHeap::structural_eq) to compare
/// contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackItem {
    ByteArray(Bytes),
    Boolean(bool),
    /// Arbitrary-precision signed integer.
    Integer(BigInt),
    Array(ArrayRef),
    /// Same storage as `Array`, but nominally distinct.
    Struct(ArrayRef),
    Map(MapRef),
    /// Host object reference; never serializable.
    Interop(HostRef),
}

impl StackItem {
    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            StackItem::ByteArray(_) => "ByteArray",
            StackItem::Boolean(_) => "Boolean",
            StackItem::Integer(_) => "Integer",
            StackItem::Array(_) => "Array",
            StackItem::Struct(_) => "Struct",
            StackItem::Map(_) => "Map",
            StackItem::Interop(_) => "Interop",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            StackItem::Array(_) | StackItem::Struct(_) | StackItem::Map(_)
        )
    }

    /// Returns the byte representation of a primitive item.
    ///
    /// Booleans map to `[1]` / `[]`, integers to their minimal two's-complement
    /// little-endian bytes. Containers and host references have none.
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            StackItem::ByteArray(b) => Some(b.clone()),
            StackItem::Boolean(true) => Some(Bytes::from([1u8])),
            StackItem::Boolean(false) => Some(Bytes::empty()),
            StackItem::Integer(i) => Some(Bytes::from(integer_to_bytes(i))),
            _ => None,
        }
    }
}

/// Encodes an integer as minimal little-endian two's complement; zero is empty.
pub fn integer_to_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_signed_bytes_le()
    }
}

/// Decodes little-endian two's complement bytes; the empty slice is zero.
pub fn integer_from_bytes(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        BigInt::zero()
    } else {
        BigInt::from_signed_bytes_le(bytes)
    }
}

impl From<bool> for StackItem {
    fn from(v: bool) -> Self {
        StackItem::Boolean(v)
    }
}

impl From<i64> for StackItem {
    fn from(v: i64) -> Self {
        StackItem::Integer(BigInt::from(v))
    }
}

impl From<i32> for StackItem {
    fn from(v: i32) -> Self {
        StackItem::Integer(BigInt::from(v))
    }
}

impl From<BigInt> for StackItem {
    fn from(v: BigInt) -> Self {
        StackItem::Integer(v)
    }
}

impl From<Bytes> for StackItem {
    fn from(v: Bytes) -> Self {
        StackItem::ByteArray(v)
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(v: Vec<u8>) -> Self {
        StackItem::ByteArray(Bytes::from(v))
    }
}

impl From<&[u8]> for StackItem {
    fn from(v: &[u8]) -> Self {
        StackItem::ByteArray(Bytes::from(v))
    }
}

/// A primitive usable as a map key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    ByteArray(Bytes),
    Boolean(bool),
    Integer(BigInt),
}

impl MapKey {
    /// Converts a stack item into a key, returning `None` for containers and host references.
    pub fn from_item(item: &StackItem) -> Option<MapKey> {
        match item {
            StackItem::ByteArray(b) => Some(MapKey::ByteArray(b.clone())),
            StackItem::Boolean(b) => Some(MapKey::Boolean(*b)),
            StackItem::Integer(i) => Some(MapKey::Integer(i.clone())),
            _ => None,
        }
    }

    pub fn to_item(&self) -> StackItem {
        match self {
            MapKey::ByteArray(b) => StackItem::ByteArray(b.clone()),
            MapKey::Boolean(b) => StackItem::Boolean(*b),
            MapKey::Integer(i) => StackItem::Integer(i.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_bytes_are_minimal() {
        assert_eq!(integer_to_bytes(&BigInt::from(0)), Vec::<u8>::new());
        assert_eq!(integer_to_bytes(&BigInt::from(1)), vec![0x01]);
        assert_eq!(integer_to_bytes(&BigInt::from(-1)), vec![0xFF]);
        assert_eq!(integer_to_bytes(&BigInt::from(128)), vec![0x80, 0x00]);
        assert_eq!(integer_to_bytes(&BigInt::from(-129)), vec![0x7F, 0xFF]);
    }

    #[test]
    fn integer_bytes_decode() {
        assert_eq!(integer_from_bytes(&[]), BigInt::from(0));
        assert_eq!(integer_from_bytes(&[0xFF]), BigInt::from(-1));
        assert_eq!(integer_from_bytes(&[0x80, 0x00]), BigInt::from(128));
        assert_eq!(integer_from_bytes(&[0x00]), BigInt::from(0));
    }

    #[test]
    fn large_integer_survives_bytes() {
        let big: BigInt = "-123456789012345678901234567890".parse().unwrap();
        assert_eq!(integer_from_bytes(&integer_to_bytes(&big)), big);
    }

    #[test]
    fn primitive_to_bytes() {
        assert_eq!(
            StackItem::Boolean(true).to_bytes(),
            Some(Bytes::from([1u8]))
        );
        assert_eq!(StackItem::Boolean(false).to_bytes(), Some(Bytes::empty()));
        assert_eq!(StackItem::from(-1).to_bytes(), Some(Bytes::from([0xFFu8])));
        assert_eq!(StackItem::Array(ArrayRef(0)).to_bytes(), None);
        assert_eq!(StackItem::Interop(HostRef(1)).to_bytes(), None);
    }

    #[test]
    fn map_key_rejects_containers() {
        assert!(MapKey::from_item(&StackItem::Map(MapRef(0))).is_none());
        assert!(MapKey::from_item(&StackItem::Interop(HostRef(0))).is_none());
        let key = MapKey::from_item(&StackItem::from(7)).unwrap();
        assert_eq!(key.to_item(), StackItem::from(7));
    }
}
