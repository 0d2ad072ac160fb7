// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Storage context establishing the vault and gating file reads.
// Author: Lukas Bower

//! Vault establishment and gated reads.
//!
//! `init_from_filesystem` either yields a usable context or fails as a whole:
//! there is no partially trusted state. Once a manifest is loaded, files it
//! does not list are refused before the filesystem is consulted.

use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, error, info, warn};

use crate::error::{StorageError, Violation};
use crate::fs::{Directory, FileSystem, FsError};
use crate::key::VaultKey;
use crate::manifest::{
    FileDigest, VaultManifest, VAULT_PATH, VAULT_SIGNATURE_PATH, VAULT_VERSION,
};

/// Largest file size [`StorageContext::read_file`] accepts.
pub const MAX_FILE_SIZE: usize = u32::MAX as usize - 2;

const TERMINATOR_BYTES: usize = 2;

/// File contents returned by [`StorageContext::read_file`].
///
/// The buffer carries two zero bytes past the reported size so the contents
/// can be treated as a terminated narrow or wide string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    buffer: Vec<u8>,
    size: usize,
}

impl FileData {
    fn new(mut buffer: Vec<u8>) -> Self {
        let size = buffer.len();
        buffer.resize(size + TERMINATOR_BYTES, 0);
        Self { buffer, size }
    }

    /// File contents without the terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.size]
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// File contents followed by two zero bytes.
    #[must_use]
    pub fn as_terminated(&self) -> &[u8] {
        &self.buffer
    }

    /// Take the contents, dropping the terminator.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buffer.truncate(self.size);
        self.buffer
    }
}

/// A storage root together with its optional vault.
#[derive(Debug)]
pub struct StorageContext<D> {
    root: D,
    vault: Option<VaultManifest>,
}

impl<D: Directory> StorageContext<D> {
    /// Open `path` on `filesystem` and establish the vault.
    ///
    /// With `key` supplied the volume must carry a signature matching the
    /// manifest. A volume without a manifest is accepted unvaulted only when
    /// no signature is present.
    pub fn init_from_filesystem<F>(
        filesystem: &F,
        path: &str,
        key: Option<&dyn VaultKey>,
    ) -> Result<Self, StorageError>
    where
        F: FileSystem<Directory = D>,
    {
        let root = filesystem.open_root(path).map_err(|err| {
            error!("[storage] cannot open root path={path} err={err}");
            StorageError::Filesystem(err)
        })?;

        let signature = match key {
            Some(key) => Some(read_signature(&root, key)?),
            None => None,
        };

        let manifest_bytes = match root.read_file(VAULT_PATH) {
            Ok(bytes) => Some(bytes),
            Err(FsError::NotFound) => None,
            Err(err) => {
                error!("[storage] cannot read vault path={VAULT_PATH} err={err}");
                return Err(StorageError::Filesystem(err));
            }
        };

        let Some(manifest_bytes) = manifest_bytes else {
            if signature.is_some() {
                error!("[storage] signature present without vault path={VAULT_PATH}");
                return Err(Violation::SignatureWithoutVault.into());
            }
            info!("[storage] no vault path={path}");
            return Ok(Self { root, vault: None });
        };

        if let (Some(key), Some(signature)) = (key, signature.as_deref()) {
            let digest = crate::sha256(&manifest_bytes);
            if !key.verify_digest(&digest, signature) {
                error!("[storage] vault signature mismatch path={VAULT_PATH}");
                return Err(Violation::InvalidSignature.into());
            }
            debug!("[storage] vault signature verified");
        }

        let Some(vault) = VaultManifest::parse(&manifest_bytes) else {
            error!("[storage] vault manifest is malformed path={VAULT_PATH}");
            return Err(StorageError::InvalidManifest);
        };

        if vault.version != VAULT_VERSION {
            error!(
                "[storage] vault version mismatch found={} expected={VAULT_VERSION}",
                vault.version
            );
            return Err(StorageError::Unsupported {
                found: vault.version,
                expected: VAULT_VERSION,
            });
        }

        info!(
            "[storage] vault loaded files={} signed={}",
            vault.files.len(),
            key.is_some()
        );
        Ok(Self {
            root,
            vault: Some(vault),
        })
    }

    /// Whether a vault manifest governs this context.
    #[must_use]
    pub fn has_vault(&self) -> bool {
        self.vault.is_some()
    }

    /// The loaded manifest.
    #[must_use]
    pub fn vault(&self) -> Option<&VaultManifest> {
        self.vault.as_ref()
    }

    /// Root directory handle.
    #[must_use]
    pub fn root(&self) -> &D {
        &self.root
    }

    /// Digest the vault records for `filename`.
    #[must_use]
    pub fn digest(&self, filename: &str) -> Option<&FileDigest> {
        self.vault.as_ref()?.digest(filename)
    }

    /// Read `filename`, enforcing the vault when one is loaded.
    pub fn read_file(&self, filename: &str) -> Result<FileData, StorageError> {
        let digest = self.digest(filename);
        if self.has_vault() && digest.is_none() {
            warn!("[storage] aborting access path={filename} reason=not-in-vault");
            return Err(StorageError::NotInVault(String::from(filename)));
        }

        let bytes = self.root.read_file(filename).map_err(|err| {
            debug!("[storage] read failed path={filename} err={err}");
            StorageError::Filesystem(err)
        })?;

        if bytes.len() > MAX_FILE_SIZE {
            warn!("[storage] file too large path={filename} size={}", bytes.len());
            return Err(StorageError::TooLarge { size: bytes.len() });
        }

        if let Some(expected) = digest {
            let actual = crate::sha256(&bytes);
            if actual != *expected {
                error!("[storage] aborting access path={filename} reason=digest-mismatch");
                return Err(StorageError::DigestMismatch(String::from(filename)));
            }
        }

        debug!("[storage] read path={filename} size={}", bytes.len());
        Ok(FileData::new(bytes))
    }

    /// Whether `filename` can be found.
    ///
    /// Vaulted files exist by definition. With a vault loaded, unlisted files
    /// are reported absent without consulting the directory.
    #[must_use]
    pub fn file_exists(&self, filename: &str) -> bool {
        if self.digest(filename).is_some() {
            return true;
        }
        if self.has_vault() {
            return false;
        }
        self.root.file_exists(filename)
    }

    /// Release the directory handle and the manifest.
    pub fn free(self) {
        debug!("[storage] releasing context vault={}", self.has_vault());
    }
}

fn read_signature<D: Directory>(root: &D, key: &dyn VaultKey) -> Result<Vec<u8>, StorageError> {
    let signature = root.read_file(VAULT_SIGNATURE_PATH).map_err(|err| {
        error!("[storage] missing signature path={VAULT_SIGNATURE_PATH} err={err}");
        StorageError::from(Violation::MissingSignature)
    })?;
    let expected = key.signature_size();
    if signature.len() != expected {
        error!(
            "[storage] signature size mismatch expected={expected} actual={}",
            signature.len()
        );
        return Err(Violation::SignatureSize {
            expected,
            actual: signature.len(),
        }
        .into());
    }
    Ok(signature)
}
