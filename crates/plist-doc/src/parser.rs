// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Parse XML property-list bytes into an owned document tree.
// Author: Lukas Bower

//! Non-destructive XML parser for the plist dialect.

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::node::Node;

/// Largest document accepted by [`Document::parse`].
pub const MAX_DOCUMENT_SIZE: usize = 32 * 1024 * 1024;

/// Deepest element nesting accepted by [`Document::parse`].
pub const MAX_NEST_LEVEL: usize = 32;

/// Errors raised while building a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Input contained no bytes.
    #[error("document is empty")]
    Empty,
    /// Input exceeded [`MAX_DOCUMENT_SIZE`].
    #[error("document of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Input size in bytes.
        size: usize,
        /// Accepted maximum.
        max: usize,
    },
    /// Input ended inside a construct.
    #[error("unexpected end of document")]
    UnexpectedEof,
    /// A specific token was required.
    #[error("expected {expected} at offset {offset}")]
    Expected {
        /// Description of the missing token.
        expected: &'static str,
        /// Byte offset of the failure.
        offset: usize,
    },
    /// Closing tag did not match the open element.
    #[error("closing tag </{found}> does not match <{open}>")]
    TagMismatch {
        /// Name of the open element.
        open: String,
        /// Name found in the closing tag.
        found: String,
    },
    /// Nesting exceeded [`MAX_NEST_LEVEL`].
    #[error("element nesting exceeds {0} levels")]
    NestTooDeep(usize),
    /// Input was not UTF-8.
    #[error("document is not valid UTF-8")]
    InvalidUtf8,
    /// An element had no name.
    #[error("empty tag name at offset {0}")]
    EmptyTagName(usize),
    /// Malformed `&...;` reference in text content.
    #[error("invalid entity reference at offset {0}")]
    InvalidEntity(usize),
    /// An element held both text and child elements.
    #[error("element <{0}> mixes text and child elements")]
    MixedContent(String),
    /// Content followed the root element.
    #[error("trailing content at offset {0}")]
    TrailingContent(usize),
}

/// An owned, parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parse `bytes` into a document. The input is left untouched.
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::Empty);
        }
        if bytes.len() > MAX_DOCUMENT_SIZE {
            return Err(DocumentError::TooLarge {
                size: bytes.len(),
                max: MAX_DOCUMENT_SIZE,
            });
        }
        let text = core::str::from_utf8(bytes).map_err(|_| DocumentError::InvalidUtf8)?;
        let mut cursor = Cursor { text, pos: 0 };
        cursor.skip_misc()?;
        let root = cursor.element(1)?;
        cursor.skip_misc()?;
        if cursor.pos != text.len() {
            return Err(DocumentError::TrailingContent(cursor.pos));
        }
        log::trace!("[plist] parsed document root={} bytes={}", root.name(), bytes.len());
        Ok(Self { root })
    }

    /// Wrap an existing element as a document root.
    #[must_use]
    pub fn from_root(root: Node) -> Self {
        Self { root }
    }

    /// Root element.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Consume the document and return its root element.
    #[must_use]
    pub fn into_root(self) -> Node {
        self.root
    }

    /// The single value held by a `<plist>` root element.
    #[must_use]
    pub fn plist_root(&self) -> Option<&Node> {
        if self.root.name() != "plist" {
            log::debug!("[plist] root element is not plist name={}", self.root.name());
            return None;
        }
        match self.root.children() {
            [value] => Some(value),
            children => {
                log::debug!("[plist] plist root has {} children", children.len());
                None
            }
        }
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        self.pos += rest.len() - trimmed.len();
    }

    fn skip_past(&mut self, terminator: &str) -> Result<(), DocumentError> {
        let found = self
            .rest()
            .find(terminator)
            .ok_or(DocumentError::UnexpectedEof)?;
        self.pos += found + terminator.len();
        Ok(())
    }

    /// Skip whitespace, processing instructions, comments and declarations.
    fn skip_misc(&mut self) -> Result<(), DocumentError> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with("<!--") {
                self.pos += 4;
                self.skip_past("-->")?;
            } else if rest.starts_with("<!") {
                self.skip_past(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn element(&mut self, level: usize) -> Result<Node, DocumentError> {
        if level > MAX_NEST_LEVEL {
            return Err(DocumentError::NestTooDeep(MAX_NEST_LEVEL));
        }
        if !self.rest().starts_with('<') {
            return Err(if self.rest().is_empty() {
                DocumentError::UnexpectedEof
            } else {
                DocumentError::Expected {
                    expected: "element",
                    offset: self.pos,
                }
            });
        }
        self.pos += 1;

        let name_start = self.pos;
        let name_len = self
            .rest()
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
            .ok_or(DocumentError::UnexpectedEof)?;
        if name_len == 0 {
            return Err(DocumentError::EmptyTagName(name_start));
        }
        let name = String::from(&self.rest()[..name_len]);
        self.pos += name_len;

        let (attributes, self_closing) = self.attributes()?;
        if self_closing {
            return Ok(Node::from_parts(name, attributes, None, Vec::new()));
        }

        let mut children = Vec::new();
        let mut text = String::new();
        loop {
            self.skip_misc()?;
            let rest = self.rest();
            if rest.is_empty() {
                return Err(DocumentError::UnexpectedEof);
            }
            if rest.starts_with("</") {
                self.close_tag(&name)?;
                break;
            }
            if rest.starts_with('<') {
                children.push(self.element(level + 1)?);
                continue;
            }
            let end = rest.find('<').ok_or(DocumentError::UnexpectedEof)?;
            let offset = self.pos;
            unescape_into(&rest[..end], offset, &mut text)?;
            self.pos += end;
        }

        let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace());
        if !trimmed.is_empty() && !children.is_empty() {
            return Err(DocumentError::MixedContent(name));
        }
        let content = if trimmed.is_empty() {
            None
        } else {
            Some(String::from(trimmed))
        };
        Ok(Node::from_parts(name, attributes, content, children))
    }

    fn attributes(&mut self) -> Result<(Option<String>, bool), DocumentError> {
        let start = self.pos;
        let mut quote = None;
        for (index, c) in self.rest().char_indices() {
            match (quote, c) {
                (Some(open), c) if c == open => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '>') => {
                    let raw = &self.text[start..start + index];
                    self.pos = start + index + 1;
                    let (raw, self_closing) = match raw.strip_suffix('/') {
                        Some(raw) => (raw, true),
                        None => (raw, false),
                    };
                    let raw = raw.trim();
                    let attributes = if raw.is_empty() {
                        None
                    } else {
                        Some(String::from(raw))
                    };
                    return Ok((attributes, self_closing));
                }
                (None, _) => {}
            }
        }
        Err(DocumentError::UnexpectedEof)
    }

    fn close_tag(&mut self, open: &str) -> Result<(), DocumentError> {
        self.pos += 2;
        let end = self.rest().find('>').ok_or(DocumentError::UnexpectedEof)?;
        let found = self.rest()[..end].trim_end();
        if found != open {
            return Err(DocumentError::TagMismatch {
                open: String::from(open),
                found: String::from(found),
            });
        }
        self.pos += end + 1;
        Ok(())
    }
}

fn unescape_into(raw: &str, offset: usize, out: &mut String) -> Result<(), DocumentError> {
    let mut rest = raw;
    let mut consumed = 0;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let at = offset + consumed + amp;
        let tail = &rest[amp + 1..];
        let semi = tail.find(';').ok_or(DocumentError::InvalidEntity(at))?;
        let entity = &tail[..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(decimal) = entity.strip_prefix('#') {
                    decimal.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or(DocumentError::InvalidEntity(at))?
            }
        };
        out.push(decoded);
        let step = amp + 1 + semi + 1;
        consumed += step;
        rest = &rest[step..];
    }
    out.push_str(rest);
    Ok(())
}
