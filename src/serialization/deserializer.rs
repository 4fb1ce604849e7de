use crate::serialization::StackItemType;
use crate::serialization::errors::{DeserializeError, FormatError};
use crate::serialization::wire::WireReader;
use crate::types::bytes::Bytes;
use crate::virtual_machine::heap::{MapEntries, ValueHeap};
use crate::virtual_machine::limits::ExecutionLimits;
use crate::virtual_machine::stack_item::{MapKey, StackItem, integer_from_bytes};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContainerKind {
    Array,
    Struct,
    Map,
}

/// One node of the input in pre-order.
enum Flat {
    Leaf(StackItem),
    /// `count` is the element count, or the entry count for maps.
    Container { kind: ContainerKind, count: usize },
}

/// Decodes a single stack item from `data`, allocating its containers in `heap`.
///
/// Byte arrays and integers are capped at `limits.max_item_size` bytes and container
/// counts at `limits.max_array_size`. Both are checked before anything is allocated.
/// The whole input must be consumed. On failure the heap is left as it was.
pub fn deserialize(
    heap: &mut ValueHeap,
    data: &[u8],
    limits: &ExecutionLimits,
) -> Result<StackItem, DeserializeError> {
    let flat = flatten(data, limits)?;
    let mark = heap.mark();
    rebuild(heap, flat).inspect_err(|_| heap.rollback(mark))
}

/// Reads every node of the input into a flat pre-order list.
fn flatten(data: &[u8], limits: &ExecutionLimits) -> Result<Vec<Flat>, DeserializeError> {
    let mut reader = WireReader::new(data);
    let mut flat = Vec::new();
    let mut remaining: u64 = 1;
    let max_count = limits.max_array_size as u64;

    while remaining > 0 {
        remaining -= 1;
        let offset = reader.offset();
        let tag = reader.read_u8()?;
        let node = match StackItemType::try_from(tag) {
            Ok(StackItemType::ByteArray) => {
                let bytes = reader.read_var_bytes(limits.max_item_size)?;
                Flat::Leaf(StackItem::ByteArray(Bytes::from(bytes)))
            }
            Ok(StackItemType::Boolean) => Flat::Leaf(StackItem::Boolean(reader.read_u8()? != 0)),
            Ok(StackItemType::Integer) => {
                let bytes = reader.read_var_bytes(limits.max_item_size)?;
                Flat::Leaf(StackItem::Integer(integer_from_bytes(bytes)))
            }
            Ok(ty @ (StackItemType::Array | StackItemType::Struct)) => {
                let count = reader.read_var_int(max_count, "array length")?;
                remaining = remaining.saturating_add(count);
                let kind = if ty == StackItemType::Struct {
                    ContainerKind::Struct
                } else {
                    ContainerKind::Array
                };
                Flat::Container {
                    kind,
                    count: count as usize,
                }
            }
            Ok(StackItemType::Map) => {
                let count = reader.read_var_int(max_count, "map size")?;
                remaining = remaining.saturating_add(count.saturating_mul(2));
                Flat::Container {
                    kind: ContainerKind::Map,
                    count: count as usize,
                }
            }
            Ok(StackItemType::Interop) | Err(_) => {
                return Err(FormatError::InvalidTag { tag, offset }.into());
            }
        };
        flat.push(node);

        // Every pending node needs at least its tag byte.
        if remaining > reader.remaining() as u64 {
            return Err(FormatError::UnexpectedEof {
                offset: data.len(),
            }
            .into());
        }
    }

    if reader.remaining() > 0 {
        return Err(FormatError::TrailingBytes {
            remaining: reader.remaining(),
        }
        .into());
    }
    Ok(flat)
}

/// Rebuilds the item graph from the flat list, children before parents.
fn rebuild(heap: &mut ValueHeap, flat: Vec<Flat>) -> Result<StackItem, DeserializeError> {
    let mut results: Vec<StackItem> = Vec::new();

    for node in flat.into_iter().rev() {
        match node {
            Flat::Leaf(item) => results.push(item),
            Flat::Container { kind, count } => {
                let arity = if kind == ContainerKind::Map {
                    count * 2
                } else {
                    count
                };
                let split = results
                    .len()
                    .checked_sub(arity)
                    .ok_or(FormatError::UnexpectedEof { offset: 0 })?;
                // Children were pushed last-first.
                let mut children = results.split_off(split);
                children.reverse();

                let item = match kind {
                    ContainerKind::Array => heap.new_array(children)?,
                    ContainerKind::Struct => heap.new_struct(children)?,
                    ContainerKind::Map => {
                        let mut entries = MapEntries::with_capacity(count);
                        let mut children = children.into_iter();
                        while let (Some(key), Some(value)) = (children.next(), children.next()) {
                            let key = MapKey::from_item(&key).ok_or(FormatError::InvalidMapKey {
                                actual: key.type_name(),
                            })?;
                            entries.insert(key, value);
                        }
                        StackItem::Map(heap.alloc_map(entries)?)
                    }
                };
                results.push(item);
            }
        }
    }

    match (results.pop(), results.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(FormatError::UnexpectedEof { offset: 0 }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::serialize;
    use num_bigint::BigInt;

    fn limits() -> ExecutionLimits {
        ExecutionLimits::default()
    }

    fn decode(data: &[u8]) -> Result<StackItem, DeserializeError> {
        deserialize(&mut ValueHeap::new(), data, &limits())
    }

    /// `Array[1, [0xAB], Map{true: -1}]`
    fn example(heap: &mut ValueHeap) -> StackItem {
        let map = heap.new_map().unwrap();
        let StackItem::Map(m) = map else {
            panic!("expected map");
        };
        heap.map_insert(m, &StackItem::Boolean(true), StackItem::from(-1))
            .unwrap();
        heap.new_array(vec![StackItem::from(1), StackItem::from(vec![0xAB]), map]).unwrap()
    }

    #[test]
    fn primitives_decode() {
        assert_eq!(decode(&[0x00, 0x01, 0xAB]), Ok(StackItem::from(vec![0xAB])));
        assert_eq!(decode(&[0x00, 0x00]), Ok(StackItem::from(Vec::<u8>::new())));
        assert_eq!(decode(&[0x01, 0x00]), Ok(StackItem::Boolean(false)));
        assert_eq!(decode(&[0x02, 0x00]), Ok(StackItem::from(0)));
        assert_eq!(decode(&[0x02, 0x02, 0x80, 0x00]), Ok(StackItem::from(128)));
    }

    #[test]
    fn any_non_zero_boolean_byte_is_true() {
        assert_eq!(decode(&[0x01, 0x02]), Ok(StackItem::Boolean(true)));
        assert_eq!(decode(&[0x01, 0xFF]), Ok(StackItem::Boolean(true)));
    }

    #[test]
    fn example_value_roundtrips() {
        let mut heap = ValueHeap::new();
        let original = example(&mut heap);
        let bytes = serialize(&heap, &original, &limits()).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x80, 0x03, // array of 3
                0x02, 0x01, 0x01, // 1
                0x00, 0x01, 0xAB, // [AB]
                0x82, 0x01, // map of 1
                0x01, 0x01, // true
                0x02, 0x01, 0xFF, // -1
            ]
        );

        let decoded = deserialize(&mut heap, &bytes, &limits()).unwrap();
        assert!(heap.structural_eq(&original, &decoded).unwrap());

        let StackItem::Array(arr) = decoded else {
            panic!("expected array");
        };
        let items = heap.items(arr).unwrap();
        assert_eq!(items[0], StackItem::from(1));
        assert_eq!(items[1], StackItem::from(vec![0xAB]));
        let StackItem::Map(m) = items[2] else {
            panic!("expected map");
        };
        let entries = heap.entries(m).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries.get(&MapKey::Boolean(true)),
            Some(&StackItem::Integer(BigInt::from(-1)))
        );
    }

    #[test]
    fn struct_tag_is_preserved() {
        let mut heap = ValueHeap::new();
        let item = deserialize(&mut heap, &[0x81, 0x01, 0x01, 0x01], &limits()).unwrap();
        let StackItem::Struct(h) = item else {
            panic!("expected struct, got {item:?}");
        };
        assert_eq!(heap.items(h).unwrap(), &[StackItem::Boolean(true)]);
    }

    #[test]
    fn nested_containers_keep_order() {
        let mut heap = ValueHeap::new();
        let inner = heap.new_array(vec![StackItem::from(1), StackItem::from(2)]).unwrap();
        let outer = heap.new_array(vec![inner, StackItem::from(3)]).unwrap();
        let bytes = serialize(&heap, &outer, &limits()).unwrap();
        let decoded = deserialize(&mut heap, &bytes, &limits()).unwrap();
        assert!(heap.structural_eq(&outer, &decoded).unwrap());
    }

    #[test]
    fn every_truncation_fails() {
        let mut heap = ValueHeap::new();
        let item = example(&mut heap);
        let bytes = serialize(&heap, &item, &limits()).unwrap();
        for len in 0..bytes.len() {
            let before = heap.len();
            let result = deserialize(&mut heap, &bytes[..len], &limits());
            assert!(
                matches!(
                    result,
                    Err(DeserializeError::Format(FormatError::UnexpectedEof { .. }))
                ),
                "prefix of {len} bytes gave {result:?}"
            );
            assert_eq!(heap.len(), before);
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert_eq!(
            decode(&[0x01, 0x01, 0x00]),
            Err(DeserializeError::Format(FormatError::TrailingBytes {
                remaining: 1
            }))
        );
    }

    #[test]
    fn interop_and_unknown_tags_are_rejected() {
        assert_eq!(
            decode(&[0x40]),
            Err(DeserializeError::Format(FormatError::InvalidTag {
                tag: 0x40,
                offset: 0
            }))
        );
        assert_eq!(
            decode(&[0x80, 0x01, 0x03]),
            Err(DeserializeError::Format(FormatError::InvalidTag {
                tag: 0x03,
                offset: 2
            }))
        );
    }

    #[test]
    fn oversized_byte_array_fails_before_reading_payload() {
        let tight = ExecutionLimits::default().with_max_item_size(4);
        let result = deserialize(&mut ValueHeap::new(), &[0x00, 0x05, 1, 2, 3, 4, 5], &tight);
        assert_eq!(
            result,
            Err(DeserializeError::LimitExceeded {
                what: "byte array length",
                limit: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn oversized_integer_fails() {
        let tight = ExecutionLimits::default().with_max_item_size(1);
        assert!(matches!(
            deserialize(&mut ValueHeap::new(), &[0x02, 0x02, 0x00, 0x01], &tight),
            Err(DeserializeError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn huge_declared_length_does_not_allocate() {
        // Length 0xFFFF_FFFF with no payload behind it.
        let data = [0x00, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF];
        let loose = ExecutionLimits::default().with_max_item_size(usize::MAX);
        assert!(matches!(
            deserialize(&mut ValueHeap::new(), &data, &loose),
            Err(DeserializeError::Format(FormatError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn container_count_over_limit_fails() {
        let tight = ExecutionLimits::default().with_max_array_size(2);
        assert_eq!(
            deserialize(
                &mut ValueHeap::new(),
                &[0x80, 0x03, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00],
                &tight
            ),
            Err(DeserializeError::LimitExceeded {
                what: "array length",
                limit: 2,
                actual: 3
            })
        );
        assert!(matches!(
            deserialize(&mut ValueHeap::new(), &[0x82, 0x03], &tight),
            Err(DeserializeError::LimitExceeded { what: "map size", .. })
        ));
    }

    #[test]
    fn count_larger_than_input_fails_early() {
        let data = [0x80, 0xFD, 0x00, 0x04];
        assert!(matches!(
            decode(&data),
            Err(DeserializeError::Format(FormatError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn container_map_key_is_rejected_and_heap_restored() {
        let mut heap = ValueHeap::new();
        // Map{ Array[]: true }
        let data = [0x82, 0x01, 0x80, 0x00, 0x01, 0x01];
        assert_eq!(
            deserialize(&mut heap, &data, &limits()),
            Err(DeserializeError::Format(FormatError::InvalidMapKey {
                actual: "Array"
            }))
        );
        assert!(heap.is_empty());
    }

    #[test]
    fn duplicate_map_keys_keep_last_value() {
        let mut heap = ValueHeap::new();
        // Map{ 1: false, 1: true }
        let data = [0x82, 0x02, 0x02, 0x01, 0x01, 0x01, 0x00, 0x02, 0x01, 0x01, 0x01, 0x01];
        let StackItem::Map(m) = deserialize(&mut heap, &data, &limits()).unwrap() else {
            panic!("expected map");
        };
        let entries = heap.entries(m).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries.get(&MapKey::Integer(BigInt::from(1))),
            Some(&StackItem::Boolean(true))
        );
    }

    #[test]
    fn non_canonical_length_is_rejected() {
        assert!(matches!(
            decode(&[0x00, 0xFD, 0x01, 0x00, 0xAA]),
            Err(DeserializeError::Format(FormatError::NonCanonicalVarInt { offset: 1 }))
        ));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 100_000;
        let mut data = Vec::with_capacity(depth * 2 + 2);
        for _ in 0..depth {
            data.extend_from_slice(&[0x80, 0x01]);
        }
        data.extend_from_slice(&[0x01, 0x01]);
        let mut heap = ValueHeap::new();
        let item = deserialize(&mut heap, &data, &limits()).unwrap();
        assert!(matches!(item, StackItem::Array(_)));
        assert_eq!(heap.len(), depth);
    }
}
