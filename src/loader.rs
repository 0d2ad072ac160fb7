// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Read and deserialize config.plist through the storage vault.
// Author: Lukas Bower

use log::{info, warn};
use storage_vault::{Directory, StorageContext};

use crate::config::{BootConfig, CONFIG_SCHEMA};
use crate::policy::{enforce_vault_policy, VaultMode};
use crate::ConfigError;

/// Configuration location relative to the storage root.
pub const CONFIG_PATH: &str = "config.plist";

/// A configuration accepted by [`load_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    /// Deserialized configuration, defaults filled in for absent keys.
    pub config: BootConfig,
    /// Vault mode requested by the configuration.
    pub vault_mode: VaultMode,
    /// Recoverable problems met while deserializing.
    pub issues: u32,
}

/// Deserialize configuration bytes on top of [`BootConfig::default`].
pub fn parse_config(bytes: &[u8]) -> Result<(BootConfig, u32), ConfigError> {
    let mut config = BootConfig::default();
    let mut issues = 0;
    if !plist_schema::parse_counted(&mut config, &CONFIG_SCHEMA, bytes, &mut issues) {
        return Err(ConfigError::Malformed);
    }
    if issues > 0 {
        warn!("[config] parsed with issues count={issues}");
    }
    Ok((config, issues))
}

/// Read `config.plist` from `storage`, deserialize it and enforce its vault mode.
///
/// `key_supplied` tells whether `storage` was initialised with a signature key.
pub fn load_config<D: Directory>(
    storage: &StorageContext<D>,
    key_supplied: bool,
) -> Result<LoadedConfig, ConfigError> {
    let file = storage.read_file(CONFIG_PATH)?;
    let (config, issues) = parse_config(file.as_bytes())?;

    let mode_name = config.misc.security.vault.as_str().unwrap_or_default();
    let vault_mode: VaultMode = mode_name.parse()?;
    enforce_vault_policy(vault_mode, storage.has_vault(), key_supplied)?;

    info!(
        "[config] loaded path={CONFIG_PATH} size={} vault={vault_mode} issues={issues}",
        file.size()
    );
    Ok(LoadedConfig {
        config,
        vault_mode,
        issues,
    })
}
