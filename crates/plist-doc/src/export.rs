// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Render plist documents back to Apple XML text.
// Author: Lukas Bower

use alloc::string::String;
use alloc::vec;

use crate::node::Node;
use crate::parser::Document;

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const PLIST_DOCTYPE: &str = "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n";

impl Document {
    /// Build a `<plist version="1.0">` document holding `value`.
    #[must_use]
    pub fn from_plist_root(value: Node) -> Self {
        let root = Node::from_parts(
            String::from("plist"),
            Some(String::from("version=\"1.0\"")),
            None,
            vec![value],
        );
        Self::from_root(root)
    }

    /// Render the document as tab-indented XML with the Apple plist prolog.
    #[must_use]
    pub fn export(&self) -> String {
        let mut out = String::from(XML_HEADER);
        out.push_str(PLIST_DOCTYPE);
        write_node(&mut out, self.root(), 0);
        out
    }
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
    out.push('<');
    out.push_str(node.name());
    if let Some(attributes) = node.attributes() {
        out.push(' ');
        out.push_str(attributes);
    }

    if let Some(content) = node.content() {
        out.push('>');
        escape_into(out, content);
    } else if node.children().is_empty() {
        out.push_str("/>\n");
        return;
    } else {
        out.push_str(">\n");
        for child in node.children() {
            write_node(out, child, depth + 1);
        }
        for _ in 0..depth {
            out.push('\t');
        }
    }
    out.push_str("</");
    out.push_str(node.name());
    out.push_str(">\n");
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
