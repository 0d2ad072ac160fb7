// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define plist nodes, node typing and dictionary traversal.
// Author: Lukas Bower

//! Generic XML nodes with plist typing on top.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::slice::ChunksExact;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

/// Plist node kinds a schema can require.
///
/// [`PlistType::Any`] matches every node and leaves validation to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlistType {
    /// Matches any node.
    Any,
    /// `<array>`.
    Array,
    /// `<dict>`.
    Dict,
    /// `<key>`.
    Key,
    /// `<string>`.
    String,
    /// `<data>`, base64 encoded.
    Data,
    /// `<date>`.
    Date,
    /// `<true/>`.
    True,
    /// `<false/>`.
    False,
    /// `<real>`.
    Real,
    /// `<integer>`.
    Integer,
}

impl PlistType {
    /// Element name for this type, `None` for [`PlistType::Any`].
    #[must_use]
    pub fn element_name(self) -> Option<&'static str> {
        match self {
            PlistType::Any => None,
            PlistType::Array => Some("array"),
            PlistType::Dict => Some("dict"),
            PlistType::Key => Some("key"),
            PlistType::String => Some("string"),
            PlistType::Data => Some("data"),
            PlistType::Date => Some("date"),
            PlistType::True => Some("true"),
            PlistType::False => Some("false"),
            PlistType::Real => Some("real"),
            PlistType::Integer => Some("integer"),
        }
    }
}

impl fmt::Display for PlistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name().unwrap_or("any"))
    }
}

/// An element of a parsed document.
///
/// Nodes own their name, raw attribute text, trimmed text content and
/// children. A node has either content or children, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: Option<String>,
    content: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub(crate) fn from_parts(
        name: String,
        attributes: Option<String>,
        content: Option<String>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            name,
            attributes,
            content,
            children,
        }
    }

    /// Create an empty element with the given name.
    #[must_use]
    pub fn element(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), None, None, Vec::new())
    }

    /// Create a text element.
    #[must_use]
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let content = if content.is_empty() {
            None
        } else {
            Some(content)
        };
        Self::from_parts(name.into(), None, content, Vec::new())
    }

    /// Create a `<key>` node.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::text("key", key)
    }

    /// Create a `<string>` node.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::text("string", value)
    }

    /// Create a `<data>` node holding `bytes` as base64.
    #[must_use]
    pub fn data(bytes: &[u8]) -> Self {
        Self::text("data", BASE64_STANDARD.encode(bytes))
    }

    /// Create an `<integer>` node.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::text("integer", value.to_string())
    }

    /// Create a `<true/>` or `<false/>` node.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::element(if value { "true" } else { "false" })
    }

    /// Create an `<array>` node.
    #[must_use]
    pub fn array(items: Vec<Node>) -> Self {
        Self::from_parts(String::from("array"), None, None, items)
    }

    /// Create a `<dict>` node from ordered key/value pairs.
    #[must_use]
    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Self {
        let mut children = Vec::new();
        for (key, value) in entries {
            children.push(Node::key(key));
            children.push(value);
        }
        Self::from_parts(String::from("dict"), None, None, children)
    }

    /// Element name, e.g. `dict` or `integer`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw attribute text following the element name, if any.
    #[must_use]
    pub fn attributes(&self) -> Option<&str> {
        self.attributes.as_deref()
    }

    /// Trimmed text content, `None` for empty elements.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Child elements in document order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Number of child elements.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Reinterpret this node as `ty`, returning `None` when it does not qualify.
    #[must_use]
    pub fn cast(&self, ty: PlistType) -> Option<&Node> {
        let Some(expected) = ty.element_name() else {
            return Some(self);
        };
        if self.name != expected {
            return None;
        }
        match ty {
            PlistType::Dict => {
                if self.children.len() % 2 != 0 {
                    log::debug!("[plist] dict has odd children count={}", self.children.len());
                    return None;
                }
            }
            PlistType::Array => {}
            PlistType::Key | PlistType::Integer | PlistType::Real => {
                if self.content.is_none() || !self.children.is_empty() {
                    return None;
                }
            }
            _ => {
                if !self.children.is_empty() {
                    return None;
                }
            }
        }
        Some(self)
    }

    /// Whether this node qualifies as `ty`.
    #[must_use]
    pub fn is(&self, ty: PlistType) -> bool {
        self.cast(ty).is_some()
    }

    /// Key text of a `<key>` node.
    #[must_use]
    pub fn key_value(&self) -> Option<&str> {
        self.cast(PlistType::Key).and_then(Node::content)
    }

    /// Number of key/value pairs of a dict node.
    #[must_use]
    pub fn dict_len(&self) -> usize {
        self.children.len() / 2
    }

    /// Iterate over the key/value pairs of a dict node in document order.
    #[must_use]
    pub fn dict_entries(&self) -> DictEntries<'_> {
        DictEntries {
            pairs: self.children.chunks_exact(2),
            index: 0,
        }
    }

    /// Look up the value stored under `key` in a dict node.
    #[must_use]
    pub fn dict_get(&self, key: &str) -> Option<&Node> {
        self.dict_entries()
            .find(|entry| entry.key == Some(key))
            .map(|entry| entry.value)
    }
}

/// One key/value pair of a dict node.
#[derive(Debug, Clone, Copy)]
pub struct DictEntry<'a> {
    /// Position of the pair within the dict.
    pub index: usize,
    /// Key text, `None` when the key position does not hold a `<key>` node.
    pub key: Option<&'a str>,
    /// Value node.
    pub value: &'a Node,
}

/// Iterator over dict pairs, see [`Node::dict_entries`].
#[derive(Debug, Clone)]
pub struct DictEntries<'a> {
    pairs: ChunksExact<'a, Node>,
    index: usize,
}

impl<'a> Iterator for DictEntries<'a> {
    type Item = DictEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.pairs.next()?;
        let entry = DictEntry {
            index: self.index,
            key: pair[0].key_value(),
            value: &pair[1],
        };
        self.index += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pairs.size_hint()
    }
}

impl ExactSizeIterator for DictEntries<'_> {}
