// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load the boot configuration through the storage vault and enforce vault policy.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![no_std]

//! Trusted configuration loading for the pre-boot environment.
//!
//! The loader reads `config.plist` through a [`storage_vault::StorageContext`],
//! deserializes it into [`BootConfig`] and then checks that the vault mode the
//! configuration requests is actually satisfied by the volume.

extern crate alloc;

#[cfg(test)]
extern crate std;

mod config;
mod loader;
mod policy;

use alloc::string::String;

use storage_vault::StorageError;
use thiserror::Error;

pub use config::{
    BootConfig, DebugSettings, KernelAddEntry, KernelSection, MiscSection, NvramSection,
    SecuritySettings, UefiSection,
};
pub use loader::{load_config, parse_config, LoadedConfig, CONFIG_PATH};
pub use policy::{enforce_vault_policy, VaultMode};

/// Errors that stop configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration file could not be read through the vault.
    #[error("cannot read configuration: {0}")]
    Storage(#[from] StorageError),
    /// The configuration is not a plist with a root dictionary.
    #[error("configuration has no root dictionary")]
    Malformed,
    /// `Misc.Security.Vault` names no known mode.
    #[error("unknown vault mode {0:?}")]
    InvalidVaultMode(String),
    /// The mode requires a vault manifest but the volume has none.
    #[error("vault mode {0} requires a vault manifest")]
    VaultRequired(VaultMode),
    /// The mode requires a signed vault but no key was supplied.
    #[error("vault mode secure requires a signature key")]
    SignatureRequired,
}
