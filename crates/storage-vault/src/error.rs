// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Error types raised while establishing and using a storage vault.
// Author: Lukas Bower

use alloc::string::String;

use thiserror::Error;

use crate::fs::FsError;

/// Reasons a vault failed authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// A key was supplied but the volume has no signature.
    #[error("vault signature is missing")]
    MissingSignature,
    /// Signature length does not match the key.
    #[error("vault signature has {actual} bytes, key expects {expected}")]
    SignatureSize {
        /// Signature size of the key.
        expected: usize,
        /// Size of the signature file.
        actual: usize,
    },
    /// A signature exists but there is no manifest to check it against.
    #[error("vault signature present without a vault manifest")]
    SignatureWithoutVault,
    /// The signature does not match the manifest.
    #[error("vault signature does not match the manifest")]
    InvalidSignature,
}

/// Errors returned by [`crate::StorageContext`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The filesystem refused an operation.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),
    /// Vault authentication failed.
    #[error("security violation: {0}")]
    SecurityViolation(#[from] Violation),
    /// The manifest is not a valid plist dictionary.
    #[error("vault manifest is malformed")]
    InvalidManifest,
    /// The manifest declares a different format version.
    #[error("vault version {found} is unsupported (expected {expected})")]
    Unsupported {
        /// Version found in the manifest.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
    /// The file is not listed in the loaded vault.
    #[error("{0} is not listed in the vault")]
    NotInVault(String),
    /// The file contents do not match the vault digest.
    #[error("{0} does not match its vault digest")]
    DigestMismatch(String),
    /// The file exceeds [`crate::MAX_FILE_SIZE`].
    #[error("file of {size} bytes exceeds the storage limit")]
    TooLarge {
        /// Size of the file.
        size: usize,
    },
}

impl StorageError {
    /// Whether the error stems from vault authentication or integrity checks.
    #[must_use]
    pub fn is_security_violation(&self) -> bool {
        matches!(
            self,
            StorageError::SecurityViolation(_)
                | StorageError::NotInVault(_)
                | StorageError::DigestMismatch(_)
        )
    }
}
