// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Appliers that walk plist nodes and populate configuration fields.
// Author: Lukas Bower

//! Apply dispatch.
//!
//! Every applier receives a node that already passed the type check of its
//! [`FieldSchema`]. Failures are logged with the surrounding key as context
//! and counted in `errors`; the target keeps its previous value.

use log::{trace, warn};
use plist_doc::Node;

use crate::blob::{Blob, List, Map};
use crate::schema::{BlobKind, DictSchema, FieldSchema, ValueKind};

/// Writes the value of a node into a target structure.
pub trait Apply<T> {
    /// Decode `node` into `target`, counting recoverable problems in `errors`.
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32);
}

/// Integer field types. Values are truncated to the field width.
pub trait IntegerValue: Copy + Send + Sync + 'static {
    /// Truncate a 64-bit pattern to this width.
    fn from_bits(bits: u64) -> Self;
}

macro_rules! integer_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntegerValue for $ty {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                fn from_bits(bits: u64) -> Self {
                    bits as $ty
                }
            }
        )*
    };
}

integer_value!(u8, u16, u32, u64, i8, i16, i32, i64);

fn content_of(node: &Node) -> &str {
    node.content().unwrap_or("empty")
}

fn report_value(node: &Node, kind: &dyn core::fmt::Display, context: &str, errors: &mut u32) {
    warn!(
        "[serialize] failed to parse value node={} kind={} content=<{}> context=<{}>",
        node.name(),
        kind,
        content_of(node),
        context
    );
    *errors += 1;
}

pub(crate) struct BooleanApply<T> {
    pub(crate) field: fn(&mut T) -> &mut bool,
}

impl<T> Apply<T> for BooleanApply<T> {
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        match node.read_boolean() {
            Some(value) => *(self.field)(target) = value,
            None => report_value(node, &ValueKind::Boolean, context, errors),
        }
    }
}

pub(crate) struct IntegerApply<T, V> {
    pub(crate) field: fn(&mut T) -> &mut V,
}

impl<T, V: IntegerValue> Apply<T> for IntegerApply<T, V> {
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        match node.read_integer() {
            Some(bits) => *(self.field)(target) = V::from_bits(bits),
            None => report_value(node, &ValueKind::Integer, context, errors),
        }
    }
}

pub(crate) struct FixedApply<T, const N: usize> {
    field: fn(&mut T) -> &mut [u8; N],
    kind: ValueKind,
}

impl<T, const N: usize> FixedApply<T, N> {
    pub(crate) fn new(field: fn(&mut T) -> &mut [u8; N], kind: ValueKind) -> Self {
        Self { field, kind }
    }

    fn decode(&self, node: &Node, out: &mut [u8; N]) -> bool {
        let bytes = match self.kind {
            ValueKind::String => {
                let Some(text) = node.read_string() else {
                    return false;
                };
                if text.len() >= N {
                    return false;
                }
                text.as_bytes()
            }
            ValueKind::Data => {
                let Some(decoded) = node.read_data() else {
                    return false;
                };
                return fill_fixed(&decoded, out);
            }
            ValueKind::Metadata => {
                let Some(decoded) = node.read_metadata() else {
                    return false;
                };
                return fill_fixed(&decoded, out);
            }
            ValueKind::Boolean | ValueKind::Integer => return false,
        };
        fill_fixed(bytes, out)
    }
}

fn fill_fixed<const N: usize>(bytes: &[u8], out: &mut [u8; N]) -> bool {
    if bytes.len() > N {
        return false;
    }
    let (head, tail) = out.split_at_mut(bytes.len());
    head.copy_from_slice(bytes);
    tail.fill(0);
    true
}

impl<T, const N: usize> Apply<T> for FixedApply<T, N> {
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        let mut staged = [0u8; N];
        if self.decode(node, &mut staged) {
            *(self.field)(target) = staged;
        } else {
            report_value(node, &self.kind, context, errors);
        }
    }
}

pub(crate) struct BlobApply<T> {
    pub(crate) field: fn(&mut T) -> &mut Blob,
    pub(crate) kind: BlobKind,
}

impl<T> BlobApply<T> {
    fn size(&self, node: &Node) -> Option<usize> {
        match self.kind {
            BlobKind::Data => node.data_size(),
            BlobKind::String => node.string_size(),
            BlobKind::Metadata => node.metadata_size(),
        }
    }

    fn fill(&self, node: &Node, out: &mut [u8]) -> Option<usize> {
        match self.kind {
            BlobKind::Data => node.read_data_into(out),
            BlobKind::String => node.read_string_into(out),
            BlobKind::Metadata => node.read_metadata_into(out),
        }
    }
}

impl<T> Apply<T> for BlobApply<T> {
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        let Some(size) = self.size(node) else {
            warn!(
                "[serialize] failed to size blob node={} kind={} context=<{}>",
                node.name(),
                self.kind,
                context
            );
            *errors += 1;
            return;
        };

        let blob = (self.field)(target);
        let Some(buffer) = blob.allocate(size) else {
            warn!(
                "[serialize] failed to allocate blob size={size} context=<{}>",
                context
            );
            *errors += 1;
            return;
        };

        match self.fill(node, buffer) {
            Some(written) => blob.truncate(written),
            None => {
                blob.clear();
                report_value(node, &self.kind, context, errors);
            }
        }
    }
}

pub(crate) struct DictApply<T, U> {
    pub(crate) field: fn(&mut T) -> &mut U,
    pub(crate) schema: DictSchema<U>,
}

impl<T, U> Apply<T> for DictApply<T, U> {
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        self.schema.apply_fields((self.field)(target), node, context, errors);
    }
}

impl<T> DictSchema<T> {
    /// Walk the pairs of a dict node and apply every known key to `target`.
    pub fn apply_fields(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        for entry in node.dict_entries() {
            let Some(key) = entry.key else {
                warn!(
                    "[serialize] no key index={} context=<{}>",
                    entry.index, context
                );
                *errors += 1;
                continue;
            };

            if key.starts_with('#') {
                trace!("[serialize] skipping comment key={key}");
                continue;
            }

            let Some(field) = self.lookup(key) else {
                warn!(
                    "[serialize] no schema key={key} index={} context=<{}>",
                    entry.index, context
                );
                *errors += 1;
                continue;
            };

            let Some(value) = entry.value.cast(field.node_type()) else {
                warn!(
                    "[serialize] type mismatch key={key} expected={} found={} context=<{}>",
                    field.node_type(),
                    entry.value.name(),
                    context
                );
                *errors += 1;
                continue;
            };

            field.apply(target, value, key, errors);
        }

        for field in self.fields() {
            if !field.is_optional() && node.dict_get(field.key()).is_none() {
                warn!(
                    "[serialize] missing key={} context=<{}>",
                    field.key(),
                    context
                );
                *errors += 1;
            }
        }
    }
}

pub(crate) struct ArrayApply<T, E> {
    pub(crate) field: fn(&mut T) -> &mut List<E>,
    pub(crate) element: FieldSchema<E>,
}

impl<T, E: Default> Apply<T> for ArrayApply<T, E> {
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        let list = (self.field)(target);
        let total = node.child_count();
        for (index, child) in node.children().iter().enumerate() {
            trace!("[serialize] array element {}/{} context=<{}>", index + 1, total, context);
            let Some(child) = child.cast(self.element.node_type()) else {
                warn!(
                    "[serialize] array element type mismatch index={index} expected={} found={} context=<{}>",
                    self.element.node_type(),
                    child.name(),
                    context
                );
                *errors += 1;
                continue;
            };

            let Some(slot) = list.append() else {
                *errors += 1;
                continue;
            };
            self.element.apply(slot, child, context, errors);
        }
    }
}

pub(crate) struct MapApply<T, E> {
    pub(crate) field: fn(&mut T) -> &mut Map<E>,
    pub(crate) element: FieldSchema<E>,
}

impl<T, E: Default> Apply<T> for MapApply<T, E> {
    fn apply(&self, target: &mut T, node: &Node, context: &str, errors: &mut u32) {
        let map = (self.field)(target);
        for entry in node.dict_entries() {
            let Some(key) = entry.key else {
                warn!(
                    "[serialize] no map key index={} context=<{}>",
                    entry.index, context
                );
                *errors += 1;
                continue;
            };

            if key.starts_with('#') {
                continue;
            }

            let Some(value) = entry.value.cast(self.element.node_type()) else {
                warn!(
                    "[serialize] map value type mismatch key={key} expected={} found={} context=<{}>",
                    self.element.node_type(),
                    entry.value.name(),
                    context
                );
                *errors += 1;
                continue;
            };

            let Some(slot) = map.append(key) else {
                *errors += 1;
                continue;
            };
            self.element.apply(slot, value, key, errors);
        }
    }
}
