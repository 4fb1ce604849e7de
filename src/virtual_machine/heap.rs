//! Arena storage for container stack items.
//!
//! Arrays, structs and maps are allocated here and referenced by handle from
//! [`StackItem`]s. Handles are indices and stay valid for the lifetime of the heap,
//! which makes container identity a plain integer comparison.

use crate::virtual_machine::errors::HeapError;
use crate::virtual_machine::stack_item::{ArrayRef, MapKey, MapRef, StackItem};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Insertion-ordered entries of a map container.
pub type MapEntries = IndexMap<MapKey, StackItem>;

/// Allocation watermark of a [`ValueHeap`], used to discard a partially built graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct HeapMark {
    arrays: usize,
    maps: usize,
}

/// Per-engine arena of containers.
#[derive(Clone, Debug, Default)]
pub struct ValueHeap {
    arrays: Vec<Vec<StackItem>>,
    maps: Vec<MapEntries>,
}

impl ValueHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an element sequence and returns its handle.
    pub fn alloc_items(&mut self, items: Vec<StackItem>) -> Result<ArrayRef, HeapError> {
        let idx = next_handle(self.arrays.len())?;
        self.arrays.push(items);
        Ok(ArrayRef(idx))
    }

    /// Allocates a map and returns its handle.
    pub fn alloc_map(&mut self, entries: MapEntries) -> Result<MapRef, HeapError> {
        let idx = next_handle(self.maps.len())?;
        self.maps.push(entries);
        Ok(MapRef(idx))
    }

    /// Allocates a new array item.
    pub fn new_array(&mut self, items: Vec<StackItem>) -> Result<StackItem, HeapError> {
        self.alloc_items(items).map(StackItem::Array)
    }

    /// Allocates a new struct item.
    pub fn new_struct(&mut self, items: Vec<StackItem>) -> Result<StackItem, HeapError> {
        self.alloc_items(items).map(StackItem::Struct)
    }

    /// Allocates a new empty map item.
    pub fn new_map(&mut self) -> Result<StackItem, HeapError> {
        self.alloc_map(MapEntries::new()).map(StackItem::Map)
    }

    /// Returns the elements behind an array or struct handle.
    pub fn items(&self, handle: ArrayRef) -> Result<&[StackItem], HeapError> {
        self.arrays
            .get(handle.0 as usize)
            .map(Vec::as_slice)
            .ok_or(HeapError::BadHandle(handle.0))
    }

    pub fn items_mut(&mut self, handle: ArrayRef) -> Result<&mut Vec<StackItem>, HeapError> {
        self.arrays
            .get_mut(handle.0 as usize)
            .ok_or(HeapError::BadHandle(handle.0))
    }

    /// Appends an element to an array or struct.
    pub fn push_item(&mut self, handle: ArrayRef, item: StackItem) -> Result<(), HeapError> {
        self.items_mut(handle)?.push(item);
        Ok(())
    }

    pub fn entries(&self, handle: MapRef) -> Result<&MapEntries, HeapError> {
        self.maps
            .get(handle.0 as usize)
            .ok_or(HeapError::BadHandle(handle.0))
    }

    /// Inserts or replaces a map entry, keeping the original position of an existing key.
    ///
    /// Returns the previous value for the key, if any.
    pub fn map_insert(
        &mut self,
        handle: MapRef,
        key: &StackItem,
        value: StackItem,
    ) -> Result<Option<StackItem>, HeapError> {
        let key = MapKey::from_item(key).ok_or(HeapError::InvalidMapKey {
            actual: key.type_name(),
        })?;
        let entries = self
            .maps
            .get_mut(handle.0 as usize)
            .ok_or(HeapError::BadHandle(handle.0))?;
        Ok(entries.insert(key, value))
    }

    pub fn map_get(&self, handle: MapRef, key: &StackItem) -> Result<Option<&StackItem>, HeapError> {
        let entries = self.entries(handle)?;
        Ok(MapKey::from_item(key).and_then(|key| entries.get(&key)))
    }

    /// Number of containers allocated so far.
    pub fn len(&self) -> usize {
        self.arrays.len() + self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn mark(&self) -> HeapMark {
        HeapMark {
            arrays: self.arrays.len(),
            maps: self.maps.len(),
        }
    }

    /// Drops every container allocated after `mark`.
    pub(crate) fn rollback(&mut self, mark: HeapMark) {
        self.arrays.truncate(mark.arrays);
        self.maps.truncate(mark.maps);
    }

    /// Compares two items by content rather than identity.
    ///
    /// Walks both graphs with an explicit work stack. A pair of containers already
    /// under comparison is assumed equal, so cyclic graphs terminate.
    pub fn structural_eq(&self, a: &StackItem, b: &StackItem) -> Result<bool, HeapError> {
        let mut pending: Vec<(StackItem, StackItem)> = vec![(a.clone(), b.clone())];
        let mut visited_arrays: HashSet<(ArrayRef, ArrayRef)> = HashSet::new();
        let mut visited_maps: HashSet<(MapRef, MapRef)> = HashSet::new();

        while let Some((a, b)) = pending.pop() {
            match (&a, &b) {
                (StackItem::Array(x), StackItem::Array(y))
                | (StackItem::Struct(x), StackItem::Struct(y)) => {
                    if !visited_arrays.insert((*x, *y)) {
                        continue;
                    }
                    let (xs, ys) = (self.items(*x)?, self.items(*y)?);
                    if xs.len() != ys.len() {
                        return Ok(false);
                    }
                    pending.extend(xs.iter().cloned().zip(ys.iter().cloned()));
                }
                (StackItem::Map(x), StackItem::Map(y)) => {
                    if !visited_maps.insert((*x, *y)) {
                        continue;
                    }
                    let (xs, ys) = (self.entries(*x)?, self.entries(*y)?);
                    if xs.len() != ys.len() {
                        return Ok(false);
                    }
                    for ((kx, vx), (ky, vy)) in xs.iter().zip(ys.iter()) {
                        if kx != ky {
                            return Ok(false);
                        }
                        pending.push((vx.clone(), vy.clone()));
                    }
                }
                (StackItem::Array(_) | StackItem::Struct(_) | StackItem::Map(_), _)
                | (_, StackItem::Array(_) | StackItem::Struct(_) | StackItem::Map(_)) => {
                    return Ok(false);
                }
                _ => {
                    if a != b {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }
}

/// Handle for the container stored at index `len`.
fn next_handle(len: usize) -> Result<u32, HeapError> {
    u32::try_from(len).map_err(|_| HeapError::HandlesExhausted)
}
