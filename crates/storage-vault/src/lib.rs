// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Digest-gated, optionally signed file access for boot volumes.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![no_std]

//! Storage vault for pre-boot configuration.
//!
//! A [`StorageContext`] wraps a directory of a boot volume. When the volume
//! carries a vault manifest (`vault.plist`), every read is checked against
//! the SHA-256 digest recorded for the file and unlisted files cannot be read
//! at all. A detached signature (`vault.sig`) authenticates the manifest when
//! the caller supplies a [`VaultKey`].

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
mod fs;
mod key;
mod manifest;
mod storage;

pub use error::{StorageError, Violation};
#[cfg(feature = "std")]
pub use fs::{HostDirectory, HostFileSystem};
pub use fs::{Directory, FileSystem, FsError, MemoryDirectory, MemoryFileSystem};
pub use key::VaultKey;
pub use manifest::{
    FileDigest, VaultManifest, VAULT_PATH, VAULT_SIGNATURE_PATH, VAULT_VERSION,
};
pub use storage::{FileData, StorageContext, MAX_FILE_SIZE};

/// SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256(bytes: &[u8]) -> FileDigest {
    use sha2::{Digest, Sha256};
    Sha256::digest(bytes).into()
}
