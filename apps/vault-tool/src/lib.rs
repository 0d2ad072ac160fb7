// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Vault authoring helpers for host tooling.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Helpers for creating, signing and checking storage vaults on a host volume.

use anyhow::{anyhow, bail, Context, Result};
use ed25519_dalek::{SigningKey, VerifyingKey};
use log::{debug, info, warn};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use signature::Signer;
use std::fs;
use std::path::Path;
use storage_vault::{
    FileDigest, HostFileSystem, StorageContext, StorageError, VaultKey, VaultManifest, VAULT_PATH,
    VAULT_SIGNATURE_PATH,
};
use walkdir::WalkDir;

/// Root-relative paths never recorded in a manifest.
pub const EXCLUDED_PATHS: [&str; 2] = [VAULT_PATH, VAULT_SIGNATURE_PATH];

/// File names skipped at any depth.
pub const IGNORED_NAMES: [&str; 1] = [".DS_Store"];

/// Private key used by [`sign_vault`].
#[derive(Debug, PartialEq)]
pub enum VaultSigningKey {
    /// Ed25519 seed.
    Ed25519([u8; 32]),
    /// RSA key signing PKCS#1 v1.5 over SHA-256.
    Rsa(RsaPrivateKey),
}

impl VaultSigningKey {
    /// Short algorithm name used in logs.
    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        match self {
            VaultSigningKey::Ed25519(_) => "ed25519",
            VaultSigningKey::Rsa(_) => "rsa",
        }
    }

    /// Public half, as accepted by [`verify_vault`].
    #[must_use]
    pub fn public_key(&self) -> VaultPublicKey {
        match self {
            VaultSigningKey::Ed25519(seed) => {
                VaultPublicKey::Ed25519(SigningKey::from_bytes(seed).verifying_key())
            }
            VaultSigningKey::Rsa(key) => VaultPublicKey::Rsa(key.to_public_key()),
        }
    }

    /// Detached signature over a manifest digest.
    pub fn sign_digest(&self, digest: &FileDigest) -> Result<Vec<u8>> {
        match self {
            VaultSigningKey::Ed25519(seed) => {
                Ok(SigningKey::from_bytes(seed).sign(digest).to_bytes().to_vec())
            }
            VaultSigningKey::Rsa(key) => key
                .sign(Pkcs1v15Sign::new::<Sha256>(), digest)
                .map_err(|err| anyhow!("rsa signing failed: {err}")),
        }
    }
}

/// Public key used by [`verify_vault`].
#[derive(Debug, Clone, PartialEq)]
pub enum VaultPublicKey {
    /// Ed25519 verifying key.
    Ed25519(VerifyingKey),
    /// RSA public key.
    Rsa(RsaPublicKey),
}

impl VaultKey for VaultPublicKey {
    fn signature_size(&self) -> usize {
        match self {
            VaultPublicKey::Ed25519(key) => key.signature_size(),
            VaultPublicKey::Rsa(key) => key.size(),
        }
    }

    fn verify_digest(&self, digest: &[u8; 32], signature: &[u8]) -> bool {
        match self {
            VaultPublicKey::Ed25519(key) => key.verify_digest(digest, signature),
            VaultPublicKey::Rsa(key) => key.verify_digest(digest, signature),
        }
    }
}

/// Outcome of [`verify_vault`].
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Number of vaulted files read back.
    pub checked: usize,
    /// Files that failed, with the reason.
    pub failures: Vec<(String, StorageError)>,
}

impl VerifyReport {
    /// Whether every vaulted file passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// SHA-256 of a host file.
pub fn file_digest(path: &Path) -> Result<FileDigest> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(&bytes));
    Ok(out)
}

/// Hash every regular file under `root` into a manifest.
///
/// Keys are relative paths joined with `\`, sorted bytewise.
pub fn build_manifest(root: &Path) -> Result<VaultManifest> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if IGNORED_NAMES.contains(&name.as_ref()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} escapes {}", entry.path().display(), root.display()))?;
        let mut parts = Vec::new();
        for part in relative.components() {
            let Some(part) = part.as_os_str().to_str() else {
                bail!("{} is not valid utf-8", entry.path().display());
            };
            parts.push(part);
        }
        let key = parts.join("\\");
        if EXCLUDED_PATHS.contains(&key.as_str()) {
            continue;
        }
        // Map keys starting with '#' are comments and never reach the vault.
        if key.starts_with('#') {
            bail!("{} cannot be vaulted: names starting with '#' are comments", key);
        }
        let digest = file_digest(entry.path())?;
        debug!("[vault] hashed file={key} digest={}", hex::encode(digest));
        entries.push((key, digest));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut manifest = VaultManifest::new();
    for (key, digest) in &entries {
        manifest.insert(key, *digest);
    }
    Ok(manifest)
}

/// Build a manifest for `root` and write it to `root/vault.plist`.
pub fn create_vault(root: &Path) -> Result<VaultManifest> {
    let manifest = build_manifest(root)?;
    let path = root.join(VAULT_PATH);
    fs::write(&path, manifest.to_plist())
        .with_context(|| format!("write manifest {}", path.display()))?;
    info!(
        "[vault] created path={} files={}",
        path.display(),
        manifest.files.len()
    );
    Ok(manifest)
}

/// Sign `root/vault.plist` and write the detached signature to `root/vault.sig`.
pub fn sign_vault(root: &Path, key: &VaultSigningKey) -> Result<Vec<u8>> {
    let manifest_path = root.join(VAULT_PATH);
    let digest = file_digest(&manifest_path)?;
    let signature = key.sign_digest(&digest)?;
    let path = root.join(VAULT_SIGNATURE_PATH);
    fs::write(&path, &signature)
        .with_context(|| format!("write signature {}", path.display()))?;
    info!(
        "[vault] signed path={} algorithm={} bytes={}",
        path.display(),
        key.algorithm(),
        signature.len()
    );
    Ok(signature)
}

/// Open `root` the way the loader does and read back every vaulted file.
pub fn verify_vault(root: &Path, key: Option<&VaultPublicKey>) -> Result<VerifyReport> {
    let root_str = root
        .to_str()
        .with_context(|| format!("{} is not valid utf-8", root.display()))?;
    let storage = StorageContext::init_from_filesystem(
        &HostFileSystem,
        root_str,
        key.map(|key| key as &dyn VaultKey),
    )
    .with_context(|| format!("open vault {}", root.display()))?;
    let Some(manifest) = storage.vault() else {
        bail!("no {VAULT_PATH} under {}", root.display());
    };

    let mut report = VerifyReport::default();
    for name in manifest.files.keys() {
        report.checked += 1;
        if let Err(err) = storage.read_file(name) {
            warn!("[vault] verify failed file={name} err={err}");
            report.failures.push((name.to_owned(), err));
        }
    }
    Ok(report)
}

fn read_key_text(path: &Path, what: &str) -> Result<String> {
    let contents = fs::read(path).with_context(|| format!("read {what} {}", path.display()))?;
    String::from_utf8(contents).with_context(|| format!("{what} {} is not utf-8", path.display()))
}

fn is_pem(text: &str) -> bool {
    text.trim_start().starts_with("-----BEGIN")
}

fn decode_hex_key(text: &str, path: &Path, what: &str) -> Result<[u8; 32]> {
    let raw = hex::decode(text.trim())
        .map_err(|err| anyhow!("{what} {} must be hex: {err}", path.display()))?;
    if raw.len() != 32 {
        bail!(
            "{what} {} must be 32 bytes (got {})",
            path.display(),
            raw.len()
        );
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&raw);
    Ok(out)
}

/// Load a signing key: a hex Ed25519 seed or a PEM RSA private key.
pub fn load_signing_key(path: &Path) -> Result<VaultSigningKey> {
    let text = read_key_text(path, "signing key")?;
    if !is_pem(&text) {
        return decode_hex_key(&text, path, "signing key").map(VaultSigningKey::Ed25519);
    }
    let key = if text.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(&text).map_err(|err| anyhow!("{err}"))
    } else {
        RsaPrivateKey::from_pkcs8_pem(&text).map_err(|err| anyhow!("{err}"))
    }
    .with_context(|| format!("signing key {} is not an RSA key", path.display()))?;
    debug!("[vault] loaded rsa signing key bits={}", key.size() * 8);
    Ok(VaultSigningKey::Rsa(key))
}

/// Load a public key: a hex Ed25519 key or a PEM RSA public key.
pub fn load_public_key(path: &Path) -> Result<VaultPublicKey> {
    let text = read_key_text(path, "public key")?;
    if !is_pem(&text) {
        let raw = decode_hex_key(&text, path, "public key")?;
        return VerifyingKey::from_bytes(&raw)
            .map(VaultPublicKey::Ed25519)
            .map_err(|err| anyhow!("public key {} is invalid: {err}", path.display()));
    }
    let key = if text.contains("BEGIN RSA PUBLIC KEY") {
        RsaPublicKey::from_pkcs1_pem(&text).map_err(|err| anyhow!("{err}"))
    } else {
        RsaPublicKey::from_public_key_pem(&text).map_err(|err| anyhow!("{err}"))
    }
    .with_context(|| format!("public key {} is not an RSA key", path.display()))?;
    Ok(VaultPublicKey::Rsa(key))
}
