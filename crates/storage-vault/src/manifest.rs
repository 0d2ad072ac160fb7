// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Vault manifest model, schema and plist rendering.
// Author: Lukas Bower

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use plist_doc::{Document, Node};
use plist_schema::{DictSchema, FieldSchema, Map};
use spin::Lazy;

/// Manifest format version understood by this crate.
pub const VAULT_VERSION: u32 = 1;

/// Manifest location relative to the storage root.
pub const VAULT_PATH: &str = "vault.plist";

/// Detached manifest signature location relative to the storage root.
pub const VAULT_SIGNATURE_PATH: &str = "vault.sig";

/// SHA-256 digest of a vaulted file.
pub type FileDigest = [u8; 32];

/// Filenames and the digests their contents must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultManifest {
    /// Format version, compared against [`VAULT_VERSION`].
    pub version: u32,
    /// Digests keyed by path relative to the storage root.
    pub files: Map<FileDigest>,
}

static VAULT_SCHEMA: Lazy<DictSchema<VaultManifest>> = Lazy::new(|| {
    DictSchema::new(vec![
        FieldSchema::map(
            "Files",
            |vault: &mut VaultManifest| &mut vault.files,
            FieldSchema::fixed_data("", |digest: &mut FileDigest| digest),
        ),
        FieldSchema::integer("Version", |vault: &mut VaultManifest| &mut vault.version),
    ])
});

impl VaultManifest {
    /// Empty manifest at the current version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: VAULT_VERSION,
            files: Map::new(),
        }
    }

    /// Deserialize manifest bytes. Returns `None` when the document has no root dictionary.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let mut manifest = Self::default();
        let mut errors = 0;
        if !plist_schema::parse_counted(&mut manifest, &VAULT_SCHEMA, bytes, &mut errors) {
            return None;
        }
        if errors > 0 {
            log::warn!("[vault] manifest parsed with issues count={errors}");
        }
        Some(manifest)
    }

    /// Record `digest` for `filename`.
    pub fn insert(&mut self, filename: &str, digest: FileDigest) {
        if self.files.insert(filename, digest).is_none() {
            log::warn!("[vault] manifest entry dropped file={filename}");
        }
    }

    /// Digest recorded for `filename`.
    ///
    /// Names compare exactly: no case folding and no separator rewriting.
    #[must_use]
    pub fn digest(&self, filename: &str) -> Option<&FileDigest> {
        self.files
            .iter()
            .find(|(name, _)| name.len() == filename.len() && name.as_bytes() == filename.as_bytes())
            .map(|(_, digest)| digest)
    }

    /// Render the manifest as a plist document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let files: Vec<(String, Node)> = self
            .files
            .iter()
            .map(|(name, digest)| (String::from(name), Node::data(digest)))
            .collect();
        Document::from_plist_root(Node::dict([
            (String::from("Files"), Node::dict(files)),
            (String::from("Version"), Node::integer(i64::from(self.version))),
        ]))
    }

    /// Render the manifest as plist XML.
    #[must_use]
    pub fn to_plist(&self) -> String {
        self.to_document().export()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>Files</key>
	<dict>
		<key>OpenCore.efi</key>
		<data>AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=</data>
		<key>ACPI\SSDT-EC.aml</key>
		<data>//////////////////////////////////////////8=</data>
	</dict>
	<key>Version</key>
	<integer>1</integer>
</dict>
</plist>
"#;

    #[test]
    fn parses_manifest_entries() {
        let manifest = VaultManifest::parse(MANIFEST.as_bytes()).unwrap();
        assert_eq!(manifest.version, 1);
        assert_eq!(manifest.files.len(), 2);
        let expected: Vec<u8> = (0u8..32).collect();
        assert_eq!(manifest.digest("OpenCore.efi").map(|d| &d[..]), Some(&expected[..]));
        assert_eq!(manifest.digest("ACPI\\SSDT-EC.aml"), Some(&[0xFF; 32]));
    }

    #[test]
    fn digest_lookup_is_exact() {
        let manifest = VaultManifest::parse(MANIFEST.as_bytes()).unwrap();
        assert!(manifest.digest("opencore.efi").is_none());
        assert!(manifest.digest("ACPI/SSDT-EC.aml").is_none());
        assert!(manifest.digest("OpenCore.ef").is_none());
    }

    #[test]
    fn oversized_digests_are_zeroed() {
        let text = MANIFEST.replace(
            "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=",
            "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8gIQ==",
        );
        let manifest = VaultManifest::parse(text.as_bytes()).unwrap();
        // 34 bytes do not fit; the entry stays but its digest is zeroed.
        assert_eq!(manifest.digest("OpenCore.efi"), Some(&[0u8; 32]));
    }

    #[test]
    fn rendered_manifest_parses_back() {
        let mut manifest = VaultManifest::new();
        manifest.insert("config.plist", [0x11; 32]);
        manifest.insert("Drivers\\OpenRuntime.efi", [0x22; 32]);
        let parsed = VaultManifest::parse(manifest.to_plist().as_bytes()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn non_plist_bytes_are_rejected() {
        assert!(VaultManifest::parse(b"not a plist").is_none());
        assert!(VaultManifest::parse(b"<plist><array/></plist>").is_none());
    }
}
