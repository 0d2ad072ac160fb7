// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Field descriptors, schema builders and sorted-key lookup.
// Author: Lukas Bower

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use log::warn;
use plist_doc::{Node, PlistType};

use crate::apply::{
    Apply, ArrayApply, BlobApply, BooleanApply, DictApply, FixedApply, IntegerApply,
    IntegerValue, MapApply,
};
use crate::blob::{Blob, List, Map};

/// Decoder used by fixed-size value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `<true/>` / `<false/>`.
    Boolean,
    /// `<integer>`.
    Integer,
    /// Base64 `<data>`.
    Data,
    /// `<string>`.
    String,
    /// Data, string, integer or boolean flattened to bytes.
    Metadata,
}

impl ValueKind {
    /// Short name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Data => "data",
            ValueKind::String => "string",
            ValueKind::Metadata => "mdata",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoder used by variable-size [`Blob`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    /// Base64 `<data>`.
    Data,
    /// `<string>`.
    String,
    /// Data, string, integer or boolean flattened to bytes.
    Metadata,
}

impl BlobKind {
    /// Short name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BlobKind::Data => "data",
            BlobKind::String => "string",
            BlobKind::Metadata => "mdata",
        }
    }
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes one dictionary key and how its value lands in `T`.
pub struct FieldSchema<T> {
    key: &'static str,
    node_type: PlistType,
    optional: bool,
    applier: Box<dyn Apply<T> + Send + Sync>,
}

impl<T> fmt::Debug for FieldSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("key", &self.key)
            .field("node_type", &self.node_type)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> FieldSchema<T> {
    /// Field backed by a custom applier.
    pub fn custom(
        key: &'static str,
        node_type: PlistType,
        applier: impl Apply<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            node_type,
            optional: false,
            applier: Box::new(applier),
        }
    }

    /// Boolean field.
    pub fn boolean(key: &'static str, field: fn(&mut T) -> &mut bool) -> Self {
        Self::custom(key, PlistType::Any, BooleanApply { field })
    }

    /// Integer field, truncated to the width of `V`.
    pub fn integer<V: IntegerValue>(key: &'static str, field: fn(&mut T) -> &mut V) -> Self {
        Self::custom(key, PlistType::Any, IntegerApply { field })
    }

    /// NUL-terminated string stored in a fixed buffer; content must be shorter than `N`.
    pub fn fixed_string<const N: usize>(
        key: &'static str,
        field: fn(&mut T) -> &mut [u8; N],
    ) -> Self {
        Self::custom(key, PlistType::Any, FixedApply::new(field, ValueKind::String))
    }

    /// Base64 data stored in a fixed buffer, zero-padded.
    pub fn fixed_data<const N: usize>(key: &'static str, field: fn(&mut T) -> &mut [u8; N]) -> Self {
        Self::custom(key, PlistType::Any, FixedApply::new(field, ValueKind::Data))
    }

    /// Metadata stored in a fixed buffer, zero-padded.
    pub fn fixed_metadata<const N: usize>(
        key: &'static str,
        field: fn(&mut T) -> &mut [u8; N],
    ) -> Self {
        Self::custom(key, PlistType::Any, FixedApply::new(field, ValueKind::Metadata))
    }

    /// Variable-size string.
    pub fn string(key: &'static str, field: fn(&mut T) -> &mut Blob) -> Self {
        Self::custom(key, PlistType::Any, BlobApply { field, kind: BlobKind::String })
    }

    /// Variable-size data.
    pub fn data(key: &'static str, field: fn(&mut T) -> &mut Blob) -> Self {
        Self::custom(key, PlistType::Any, BlobApply { field, kind: BlobKind::Data })
    }

    /// Variable-size metadata.
    pub fn metadata(key: &'static str, field: fn(&mut T) -> &mut Blob) -> Self {
        Self::custom(key, PlistType::Any, BlobApply { field, kind: BlobKind::Metadata })
    }

    /// Nested dictionary deserialized into `U`.
    pub fn dict<U: 'static>(
        key: &'static str,
        field: fn(&mut T) -> &mut U,
        schema: DictSchema<U>,
    ) -> Self {
        Self::custom(key, PlistType::Dict, DictApply { field, schema })
    }

    /// Array of elements each described by `element`.
    pub fn array<E: Default + 'static>(
        key: &'static str,
        field: fn(&mut T) -> &mut List<E>,
        element: FieldSchema<E>,
    ) -> Self {
        Self::custom(key, PlistType::Array, ArrayApply { field, element })
    }

    /// Dictionary with free-form keys, each value described by `element`.
    pub fn map<E: Default + 'static>(
        key: &'static str,
        field: fn(&mut T) -> &mut Map<E>,
        element: FieldSchema<E>,
    ) -> Self {
        Self::custom(key, PlistType::Dict, MapApply { field, element })
    }

    /// Mark the field as optional; absent optional fields are not reported.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Element schema for lists and maps whose items are dictionaries.
    pub fn entry(schema: DictSchema<T>) -> Self {
        Self::dict("", |item: &mut T| item, schema)
    }
}

impl<T> FieldSchema<T> {
    /// Document key.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Node type required before the applier runs.
    #[must_use]
    pub fn node_type(&self) -> PlistType {
        self.node_type
    }

    /// Whether an absent key goes unreported.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Run the applier on a node that already passed the type check.
    pub fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        self.applier.apply(target, node, context, errors);
    }
}

/// The sorted list of fields a dictionary may carry.
pub struct DictSchema<T> {
    fields: Vec<FieldSchema<T>>,
}

impl<T> fmt::Debug for DictSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

impl<T> DictSchema<T> {
    /// Build a schema. `fields` must be sorted by key in byte order.
    ///
    /// Out-of-order fields are logged; lookups on them may miss.
    #[must_use]
    pub fn new(fields: Vec<FieldSchema<T>>) -> Self {
        if let Some(pair) = fields.windows(2).find(|pair| pair[0].key > pair[1].key) {
            warn!(
                "[serialize] schema fields out of order key={} next={}",
                pair[0].key, pair[1].key
            );
        }
        Self { fields }
    }

    /// Fields in key order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema<T>] {
        &self.fields
    }

    /// Find the field for `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&FieldSchema<T>> {
        lookup(&self.fields, key)
    }
}

/// Binary search over fields sorted by key.
///
/// Keys compare byte-wise. An unsorted slice produces wrong answers but is
/// otherwise harmless; with duplicate keys the first match on the search path
/// wins.
#[must_use]
pub fn lookup<'a, T>(fields: &'a [FieldSchema<T>], key: &str) -> Option<&'a FieldSchema<T>> {
    let mut start = 0;
    let mut end = fields.len();
    while start < end {
        let middle = start + (end - start) / 2;
        let candidate = &fields[middle];
        match key.as_bytes().cmp(candidate.key.as_bytes()) {
            core::cmp::Ordering::Equal => return Some(candidate),
            core::cmp::Ordering::Less => end = middle,
            core::cmp::Ordering::Greater => start = middle + 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[derive(Default)]
    struct Probe {
        a: bool,
        b: bool,
        c: bool,
        d: bool,
        e: bool,
    }

    fn probe_schema() -> DictSchema<Probe> {
        DictSchema::new(vec![
            FieldSchema::boolean("Alpha", |p: &mut Probe| &mut p.a),
            FieldSchema::boolean("Beta", |p: &mut Probe| &mut p.b),
            FieldSchema::boolean("Delta", |p: &mut Probe| &mut p.d),
            FieldSchema::boolean("Epsilon", |p: &mut Probe| &mut p.e),
            FieldSchema::boolean("Gamma", |p: &mut Probe| &mut p.c),
        ])
    }

    #[test]
    fn lookup_finds_every_key() {
        let schema = probe_schema();
        for field in schema.fields() {
            let found = schema.lookup(field.key()).map(FieldSchema::key);
            assert_eq!(found, Some(field.key()));
        }
    }

    #[test]
    fn lookup_reports_absent_keys() {
        let schema = probe_schema();
        for key in ["", "alpha", "Aleph", "Zeta", "Gammas", "Bet"] {
            assert!(schema.lookup(key).is_none(), "{key} should be absent");
        }
        let empty: DictSchema<Probe> = DictSchema::new(Vec::new());
        assert!(empty.lookup("Alpha").is_none());
    }

    #[test]
    fn lookup_is_repeatable() {
        let schema = probe_schema();
        let first = schema.lookup("Delta").unwrap();
        for _ in 0..8 {
            let again = schema.lookup("Delta").unwrap();
            assert!(core::ptr::eq(first, again));
        }
    }

    #[test]
    fn unsorted_fields_degrade_to_wrong_lookups() {
        let schema = DictSchema::new(vec![
            FieldSchema::boolean("Beta", |p: &mut Probe| &mut p.b),
            FieldSchema::boolean("Alpha", |p: &mut Probe| &mut p.a),
        ]);
        assert_eq!(schema.lookup("Alpha").map(FieldSchema::key), Some("Alpha"));
        assert!(schema.lookup("Beta").is_none());
    }

    #[test]
    fn builders_pick_node_types() {
        let schema = probe_schema();
        assert_eq!(schema.lookup("Alpha").map(FieldSchema::node_type), Some(PlistType::Any));
        let nested: FieldSchema<Probe> = FieldSchema::dict("Nested", |p: &mut Probe| p, probe_schema());
        assert_eq!(nested.node_type(), PlistType::Dict);
        assert!(!nested.is_optional());
        assert!(nested.optional().is_optional());
    }

    #[test]
    fn kind_names_match_diagnostics() {
        assert_eq!(ValueKind::Metadata.name(), "mdata");
        assert_eq!(BlobKind::String.to_string(), "string");
    }
}
