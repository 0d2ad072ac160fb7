// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Schema-driven deserialization of plist documents into typed configuration.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![no_std]

//! Declarative plist deserializer.
//!
//! A [`DictSchema`] lists the keys a dictionary may carry, sorted by key. Each
//! [`FieldSchema`] names the node type it accepts and an applier that writes
//! the decoded value into the caller's structure through an accessor
//! function. Problems inside the document are logged under `[serialize]` and
//! counted; they never abort the walk.
//!
//! ```
//! use plist_schema::{parse, DictSchema, FieldSchema};
//!
//! #[derive(Default)]
//! struct Flags {
//!     enabled: bool,
//!     timeout: u32,
//! }
//!
//! let schema = DictSchema::new(vec![
//!     FieldSchema::boolean("Enabled", |f: &mut Flags| &mut f.enabled),
//!     FieldSchema::integer("Timeout", |f: &mut Flags| &mut f.timeout),
//! ]);
//! let mut flags = Flags::default();
//! let document = b"<plist><dict><key>Enabled</key><true/><key>Timeout</key><integer>5</integer></dict></plist>";
//! assert!(parse(&mut flags, &schema, document));
//! assert!(flags.enabled);
//! assert_eq!(flags.timeout, 5);
//! ```

extern crate alloc;

#[cfg(test)]
extern crate std;

mod apply;
mod blob;
mod parse;
mod schema;

pub use apply::{Apply, IntegerValue};
pub use blob::{Blob, List, Map};
pub use parse::{parse, parse_counted, ROOT_CONTEXT};
pub use schema::{lookup, BlobKind, DictSchema, FieldSchema, ValueKind};

pub use plist_doc::{Node, PlistType};
