// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Provide the owned property-list document model consumed by the boot configuration layer.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![no_std]

//! Property-list (plist) document model for pre-boot configuration.
//!
//! The parser accepts the restricted Apple XML property-list dialect used by
//! bootloader configuration files and builds an owned tree of [`Node`]s. The
//! caller's byte buffer is never modified, so it can be hashed or re-parsed
//! after a document has been built from it.

extern crate alloc;

#[cfg(test)]
extern crate std;

mod export;
mod node;
mod parser;
mod value;

pub use node::{DictEntries, DictEntry, Node, PlistType};
pub use parser::{Document, DocumentError, MAX_DOCUMENT_SIZE, MAX_NEST_LEVEL};
