// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Vault mode parsing and enforcement.
// Author: Lukas Bower

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use log::error;

use crate::ConfigError;

/// How strictly the volume must be vaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VaultMode {
    /// No vault is required.
    Optional,
    /// A vault manifest is required.
    Basic,
    /// A vault manifest authenticated by a signature key is required.
    Secure,
}

impl VaultMode {
    /// Name used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VaultMode::Optional => "Optional",
            VaultMode::Basic => "Basic",
            VaultMode::Secure => "Secure",
        }
    }
}

impl fmt::Display for VaultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Optional" => Ok(VaultMode::Optional),
            "Basic" => Ok(VaultMode::Basic),
            "Secure" => Ok(VaultMode::Secure),
            other => Err(ConfigError::InvalidVaultMode(String::from(other))),
        }
    }
}

/// Check that the storage state satisfies `mode`.
pub fn enforce_vault_policy(
    mode: VaultMode,
    has_vault: bool,
    key_supplied: bool,
) -> Result<(), ConfigError> {
    if mode >= VaultMode::Basic && !has_vault {
        error!("[vault] mode={mode} requires vault.plist");
        return Err(ConfigError::VaultRequired(mode));
    }
    if mode == VaultMode::Secure && !key_supplied {
        error!("[vault] mode={mode} requires a signature key");
        return Err(ConfigError::SignatureRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!("Optional".parse::<VaultMode>(), Ok(VaultMode::Optional));
        assert_eq!("Basic".parse::<VaultMode>(), Ok(VaultMode::Basic));
        assert_eq!("Secure".parse::<VaultMode>(), Ok(VaultMode::Secure));
        assert_eq!(
            "secure".parse::<VaultMode>(),
            Err(ConfigError::InvalidVaultMode(String::from("secure")))
        );
    }

    #[test]
    fn optional_accepts_anything() {
        assert!(enforce_vault_policy(VaultMode::Optional, false, false).is_ok());
        assert!(enforce_vault_policy(VaultMode::Optional, true, true).is_ok());
    }

    #[test]
    fn basic_requires_a_vault() {
        assert_eq!(
            enforce_vault_policy(VaultMode::Basic, false, true),
            Err(ConfigError::VaultRequired(VaultMode::Basic))
        );
        assert!(enforce_vault_policy(VaultMode::Basic, true, false).is_ok());
    }

    #[test]
    fn secure_requires_vault_and_key() {
        assert_eq!(
            enforce_vault_policy(VaultMode::Secure, false, true),
            Err(ConfigError::VaultRequired(VaultMode::Secure))
        );
        assert_eq!(
            enforce_vault_policy(VaultMode::Secure, true, false),
            Err(ConfigError::SignatureRequired)
        );
        assert!(enforce_vault_policy(VaultMode::Secure, true, true).is_ok());
    }
}
