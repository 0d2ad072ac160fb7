// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Owned storage for variable-size fields and ordered containers.
// Author: Lukas Bower

//! Storage filled by the appliers.
//!
//! All growth is exact: a blob is reallocated to the requested size and a
//! container grows by one slot per appended item. Allocation failures are
//! reported as `None` so callers can log and move on.

use alloc::string::String;
use alloc::vec::Vec;

/// Variable-size byte storage bound to a configuration field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob {
    bytes: Vec<u8>,
}

impl Blob {
    /// Empty blob.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Release the current buffer and bind a zeroed buffer of `size` bytes.
    pub fn allocate(&mut self, size: usize) -> Option<&mut [u8]> {
        self.bytes = Vec::new();
        let mut bytes = Vec::new();
        if bytes.try_reserve_exact(size).is_err() {
            log::warn!("[serialize] blob allocation failed size={size}");
            return None;
        }
        bytes.resize(size, 0);
        self.bytes = bytes;
        Some(&mut self.bytes)
    }

    /// Shrink the bound size to `len` bytes actually written.
    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// Drop the buffer.
    pub fn clear(&mut self) {
        self.bytes = Vec::new();
    }

    /// Stored bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Stored bytes as UTF-8 text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    /// Number of stored bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the stored bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<&str> for Blob {
    fn from(value: &str) -> Self {
        Self {
            bytes: Vec::from(value.as_bytes()),
        }
    }
}

impl From<&[u8]> for Blob {
    fn from(value: &[u8]) -> Self {
        Self {
            bytes: Vec::from(value),
        }
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Ordered, unkeyed container filled from `<array>` nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<E> {
    items: Vec<E>,
}

impl<E> Default for List<E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<E> List<E> {
    /// Empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a value, growing by exactly one slot.
    pub fn push(&mut self, value: E) -> Option<&mut E> {
        if self.items.try_reserve_exact(1).is_err() {
            log::warn!("[serialize] list growth failed len={}", self.items.len());
            return None;
        }
        self.items.push(value);
        self.items.last_mut()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&E> {
        self.items.get(index)
    }

    /// Items in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[E] {
        &self.items
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, E> {
        self.items.iter()
    }
}

impl<E: Default> List<E> {
    /// Append a default-initialised slot and return it.
    pub fn append(&mut self) -> Option<&mut E> {
        self.push(E::default())
    }
}

impl<'a, E> IntoIterator for &'a List<E> {
    type Item = &'a E;
    type IntoIter = core::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<E> FromIterator<E> for List<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Ordered container keyed by owned strings, filled from free-form `<dict>` nodes.
///
/// Keys are kept in document order and are not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map<E> {
    entries: Vec<(String, E)>,
}

impl<E> Default for Map<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> Map<E> {
    /// Empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append `value` under a copy of `key`.
    pub fn insert(&mut self, key: &str, value: E) -> Option<&mut E> {
        if self.entries.try_reserve_exact(1).is_err() {
            log::warn!("[serialize] map growth failed len={}", self.entries.len());
            return None;
        }
        let mut owned = String::new();
        if owned.try_reserve_exact(key.len()).is_err() {
            log::warn!("[serialize] map key allocation failed len={}", key.len());
            return None;
        }
        owned.push_str(key);
        self.entries.push((owned, value));
        self.entries.last_mut().map(|(_, value)| value)
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&E> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> + '_ {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<E: Default> Map<E> {
    /// Append a default-initialised slot under a copy of `key`.
    pub fn append(&mut self, key: &str) -> Option<&mut E> {
        self.insert(key, E::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_replaces_previous_buffer() {
        let mut blob = Blob::from("previous contents");
        let buffer = blob.allocate(4).unwrap();
        assert_eq!(buffer, &[0, 0, 0, 0]);
        buffer.copy_from_slice(b"next");
        assert_eq!(blob.as_str(), Some("next"));
        assert_eq!(blob.len(), 4);
    }

    #[test]
    fn truncate_binds_written_length() {
        let mut blob = Blob::new();
        blob.allocate(8).unwrap()[..3].copy_from_slice(b"abc");
        blob.truncate(3);
        assert_eq!(blob.as_bytes(), b"abc");
        blob.clear();
        assert!(blob.is_empty());
    }

    #[test]
    fn list_preserves_order_and_defaults() {
        let mut list: List<u32> = List::new();
        *list.append().unwrap() = 7;
        assert_eq!(list.append().copied(), Some(0));
        *list.append().unwrap() = 9;
        assert_eq!(list.as_slice(), &[7, 0, 9]);
    }

    #[test]
    fn map_copies_keys_and_keeps_duplicates() {
        let mut map: Map<u8> = Map::new();
        {
            let key = alloc::string::String::from("Boot");
            *map.append(&key).unwrap() = 1;
        }
        *map.append("Boot").unwrap() = 2;
        *map.append("Args").unwrap() = 3;
        assert_eq!(map.get("Boot"), Some(&1));
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["Boot", "Boot", "Args"]);
    }
}
