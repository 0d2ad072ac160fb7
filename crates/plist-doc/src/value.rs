// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Read scalar and variable-size plist values out of document nodes.
// Author: Lukas Bower

//! Scalar readers.
//!
//! Variable-size values are read in two steps: a `*_size` probe reports how
//! many bytes the caller must provide and a `read_*_into` call fills that
//! buffer, returning the number of bytes actually written. Data probes report
//! the length of the base64 text, which is never smaller than the decoded
//! payload.

use alloc::vec::Vec;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use crate::node::{Node, PlistType};

impl Node {
    /// Read a `<true/>` or `<false/>` node.
    #[must_use]
    pub fn read_boolean(&self) -> Option<bool> {
        if self.is(PlistType::True) {
            Some(true)
        } else if self.is(PlistType::False) {
            Some(false)
        } else {
            None
        }
    }

    /// Read an `<integer>` node as its two's complement 64-bit pattern.
    ///
    /// Leading spaces and tabs are skipped, a single `-` negates with
    /// wrap-around. Callers truncate the result to their field width.
    #[must_use]
    pub fn read_integer(&self) -> Option<u64> {
        let text = self.cast(PlistType::Integer)?.content()?;
        let text = text.trim_start_matches([' ', '\t']);
        let (negate, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if digits.is_empty() {
            return None;
        }
        let mut value: u64 = 0;
        for byte in digits.bytes() {
            if !byte.is_ascii_digit() {
                return None;
            }
            value = value
                .checked_mul(10)?
                .checked_add(u64::from(byte - b'0'))?;
        }
        Some(if negate { value.wrapping_neg() } else { value })
    }

    /// Text of a `<string>` node; an empty element yields `""`.
    #[must_use]
    pub fn read_string(&self) -> Option<&str> {
        Some(self.cast(PlistType::String)?.content().unwrap_or(""))
    }

    /// Bytes required to hold the string content.
    #[must_use]
    pub fn string_size(&self) -> Option<usize> {
        self.read_string().map(str::len)
    }

    /// Copy the string content into `out`.
    #[must_use]
    pub fn read_string_into(&self, out: &mut [u8]) -> Option<usize> {
        copy_exact(self.read_string()?.as_bytes(), out)
    }

    /// Upper bound for the decoded size of a `<data>` node.
    #[must_use]
    pub fn data_size(&self) -> Option<usize> {
        let node = self.cast(PlistType::Data)?;
        Some(node.content().map_or(0, str::len))
    }

    /// Decode a `<data>` node.
    #[must_use]
    pub fn read_data(&self) -> Option<Vec<u8>> {
        let node = self.cast(PlistType::Data)?;
        let Some(text) = node.content() else {
            return Some(Vec::new());
        };
        let compact: Vec<u8> = text
            .bytes()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        match BASE64_STANDARD.decode(compact) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::debug!("[plist] base64 decode failed err={err}");
                None
            }
        }
    }

    /// Decode a `<data>` node into `out`.
    #[must_use]
    pub fn read_data_into(&self, out: &mut [u8]) -> Option<usize> {
        copy_exact(&self.read_data()?, out)
    }

    /// Bytes required for the metadata rendering of this node.
    ///
    /// Metadata accepts data, string, integer and boolean nodes.
    #[must_use]
    pub fn metadata_size(&self) -> Option<usize> {
        if let Some(size) = self.data_size() {
            return Some(size);
        }
        if let Some(text) = self.read_string() {
            return Some(text.len() + 1);
        }
        if self.is(PlistType::Integer) {
            return Some(core::mem::size_of::<u32>());
        }
        if self.read_boolean().is_some() {
            return Some(1);
        }
        None
    }

    /// Render this node as metadata bytes.
    ///
    /// Strings gain a NUL terminator, integers become four little-endian
    /// bytes and booleans a single byte. Metadata integers are unsigned:
    /// only the leading decimal digits count, so `-1` renders as zero.
    #[must_use]
    pub fn read_metadata(&self) -> Option<Vec<u8>> {
        if self.is(PlistType::Data) {
            return self.read_data();
        }
        if let Some(text) = self.read_string() {
            let mut bytes = Vec::with_capacity(text.len() + 1);
            bytes.extend_from_slice(text.as_bytes());
            bytes.push(0);
            return Some(bytes);
        }
        if self.is(PlistType::Integer) {
            let value = unsigned_prefix(self.content().unwrap_or("")) as u32;
            return Some(value.to_le_bytes().to_vec());
        }
        self.read_boolean().map(|flag| alloc::vec![u8::from(flag)])
    }

    /// Render metadata into `out`.
    #[must_use]
    pub fn read_metadata_into(&self, out: &mut [u8]) -> Option<usize> {
        copy_exact(&self.read_metadata()?, out)
    }
}

/// Leading decimal digits after blanks; anything else ends the number.
fn unsigned_prefix(text: &str) -> u64 {
    text.trim_start_matches([' ', '\t'])
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u64::from(digit - b'0'))
        })
}

fn copy_exact(source: &[u8], out: &mut [u8]) -> Option<usize> {
    let target = out.get_mut(..source.len())?;
    target.copy_from_slice(source);
    Some(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn integers_wrap_and_skip_blanks() {
        assert_eq!(Node::text("integer", " \t42").read_integer(), Some(42));
        assert_eq!(Node::integer(-1).read_integer(), Some(u64::MAX));
        assert_eq!(Node::text("integer", "12a").read_integer(), None);
        assert_eq!(Node::text("integer", "-").read_integer(), None);
        assert_eq!(Node::string("5").read_integer(), None);
    }

    #[test]
    fn integer_overflow_is_rejected() {
        let node = Node::text("integer", "18446744073709551616");
        assert_eq!(node.read_integer(), None);
    }

    #[test]
    fn booleans_require_boolean_nodes() {
        assert_eq!(Node::boolean(true).read_boolean(), Some(true));
        assert_eq!(Node::boolean(false).read_boolean(), Some(false));
        assert_eq!(Node::string("true").read_boolean(), None);
    }

    #[test]
    fn empty_string_has_zero_size() {
        let node = Node::element("string");
        assert_eq!(node.string_size(), Some(0));
        assert_eq!(node.read_string(), Some(""));
    }

    #[test]
    fn data_probe_bounds_decoded_length() {
        let node = Node::data(&[1, 2, 3, 4, 5]);
        let bound = node.data_size().unwrap();
        let mut buffer = vec![0u8; bound];
        let written = node.read_data_into(&mut buffer).unwrap();
        assert!(bound >= written);
        assert_eq!(&buffer[..written], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn data_ignores_embedded_whitespace() {
        let node = Node::text("data", "AQID\n\tBA==");
        assert_eq!(node.read_data(), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn invalid_base64_fails() {
        assert_eq!(Node::text("data", "!!!!").read_data(), None);
    }

    #[test]
    fn metadata_unifies_node_kinds() {
        assert_eq!(Node::string("ab").read_metadata(), Some(vec![b'a', b'b', 0]));
        assert_eq!(Node::string("ab").metadata_size(), Some(3));
        assert_eq!(Node::integer(0x0102_0304).read_metadata(), Some(vec![4, 3, 2, 1]));
        assert_eq!(Node::integer(7).metadata_size(), Some(4));
        assert_eq!(Node::integer(-1).read_metadata(), Some(vec![0; 4]));
        assert_eq!(Node::text("integer", " 12a").read_metadata(), Some(vec![12, 0, 0, 0]));
        assert_eq!(Node::boolean(true).read_metadata(), Some(vec![1]));
        assert_eq!(Node::boolean(false).metadata_size(), Some(1));
        assert_eq!(Node::array(Vec::new()).metadata_size(), None);
    }

    #[test]
    fn fill_rejects_short_buffers() {
        let node = Node::string("hello");
        let mut buffer = [0u8; 3];
        assert_eq!(node.read_string_into(&mut buffer), None);
    }
}
