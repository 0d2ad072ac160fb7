// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Top-level entry points turning plist bytes into typed structures.
// Author: Lukas Bower

use log::{debug, warn};
use plist_doc::{Document, PlistType};

use crate::schema::DictSchema;

/// Context label reported for keys of the root dictionary.
pub const ROOT_CONTEXT: &str = "root";

/// Deserialize `bytes` into `target`.
///
/// Returns `false` only when the document cannot be parsed or has no root
/// dictionary, in which case `target` is not touched. Skipped fields do not
/// affect the result.
pub fn parse<T>(target: &mut T, schema: &DictSchema<T>, bytes: &[u8]) -> bool {
    let mut errors = 0;
    parse_counted(target, schema, bytes, &mut errors)
}

/// Like [`parse`], adding the number of recoverable problems to `errors`.
pub fn parse_counted<T>(
    target: &mut T,
    schema: &DictSchema<T>,
    bytes: &[u8],
    errors: &mut u32,
) -> bool {
    let document = match Document::parse(bytes) {
        Ok(document) => document,
        Err(err) => {
            warn!("[serialize] couldn't parse document err={err}");
            *errors += 1;
            return false;
        }
    };

    let Some(root) = document
        .plist_root()
        .and_then(|node| node.cast(PlistType::Dict))
    else {
        warn!("[serialize] couldn't get root dict");
        *errors += 1;
        return false;
    };

    let before = *errors;
    schema.apply_fields(target, root, ROOT_CONTEXT, errors);
    debug!(
        "[serialize] parsed keys={} issues={}",
        root.dict_len(),
        *errors - before
    );
    true
}
