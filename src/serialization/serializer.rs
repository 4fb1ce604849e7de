use crate::serialization::StackItemType;
use crate::serialization::errors::SerializeError;
use crate::serialization::wire::{write_var_bytes, write_var_int};
use crate::virtual_machine::heap::ValueHeap;
use crate::virtual_machine::limits::ExecutionLimits;
use crate::virtual_machine::stack_item::{ArrayRef, MapKey, MapRef, StackItem, integer_to_bytes};
use std::collections::HashSet;

/// A node waiting to be written, or the end of a container's contents.
enum Pending<'a> {
    Item(&'a StackItem),
    Key(&'a MapKey),
    LeaveArray(ArrayRef),
    LeaveMap(MapRef),
}

/// Serializes `item` and everything reachable from it.
///
/// Fails on host references, on a container that contains itself (a container reached
/// again while its own elements are still being written), and as soon as the output
/// grows past `limits.max_item_size`. A container shared by sibling branches is written
/// once per occurrence. No output is returned on failure.
pub fn serialize<'a>(
    heap: &'a ValueHeap,
    item: &'a StackItem,
    limits: &ExecutionLimits,
) -> Result<Vec<u8>, SerializeError> {
    let mut out = Vec::new();
    let mut pending = vec![Pending::Item(item)];
    // Containers on the path from the root to the node being written.
    let mut open_arrays: HashSet<ArrayRef> = HashSet::new();
    let mut open_maps: HashSet<MapRef> = HashSet::new();

    while let Some(node) = pending.pop() {
        match node {
            Pending::Key(MapKey::ByteArray(b)) => write_byte_array(&mut out, b),
            Pending::Key(MapKey::Boolean(v)) => write_boolean(&mut out, *v),
            Pending::Key(MapKey::Integer(i)) => write_integer(&mut out, i),
            Pending::Item(StackItem::ByteArray(b)) => write_byte_array(&mut out, b),
            Pending::Item(StackItem::Boolean(v)) => write_boolean(&mut out, *v),
            Pending::Item(StackItem::Integer(i)) => write_integer(&mut out, i),
            Pending::Item(StackItem::Interop(_)) => {
                return Err(SerializeError::UnsupportedValue("Interop"));
            }
            Pending::LeaveArray(handle) => {
                open_arrays.remove(&handle);
            }
            Pending::LeaveMap(handle) => {
                open_maps.remove(&handle);
            }
            Pending::Item(StackItem::Array(handle)) => {
                open_items(
                    heap,
                    *handle,
                    StackItemType::Array,
                    &mut open_arrays,
                    &mut out,
                    &mut pending,
                )?;
            }
            Pending::Item(StackItem::Struct(handle)) => {
                open_items(
                    heap,
                    *handle,
                    StackItemType::Struct,
                    &mut open_arrays,
                    &mut out,
                    &mut pending,
                )?;
            }
            Pending::Item(StackItem::Map(handle)) => {
                if !open_maps.insert(*handle) {
                    return Err(SerializeError::CircularReference);
                }
                let entries = heap.entries(*handle)?;
                out.push(StackItemType::Map as u8);
                write_var_int(&mut out, entries.len() as u64);
                pending.push(Pending::LeaveMap(*handle));
                for (key, value) in entries.iter().rev() {
                    pending.push(Pending::Item(value));
                    pending.push(Pending::Key(key));
                }
            }
        }

        if out.len() > limits.max_item_size {
            return Err(SerializeError::ItemTooLarge {
                limit: limits.max_item_size,
            });
        }
    }

    Ok(out)
}

/// Writes the header of an array or struct and queues its elements in order.
fn open_items<'a>(
    heap: &'a ValueHeap,
    handle: ArrayRef,
    tag: StackItemType,
    open: &mut HashSet<ArrayRef>,
    out: &mut Vec<u8>,
    pending: &mut Vec<Pending<'a>>,
) -> Result<(), SerializeError> {
    if !open.insert(handle) {
        return Err(SerializeError::CircularReference);
    }
    let items = heap.items(handle)?;
    out.push(tag as u8);
    write_var_int(out, items.len() as u64);
    pending.push(Pending::LeaveArray(handle));
    pending.extend(items.iter().rev().map(Pending::Item));
    Ok(())
}

fn write_byte_array(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(StackItemType::ByteArray as u8);
    write_var_bytes(out, bytes);
}

fn write_boolean(out: &mut Vec<u8>, value: bool) {
    out.push(StackItemType::Boolean as u8);
    out.push(u8::from(value));
}

fn write_integer(out: &mut Vec<u8>, value: &num_bigint::BigInt) {
    out.push(StackItemType::Integer as u8);
    write_var_bytes(out, &integer_to_bytes(value));
}
