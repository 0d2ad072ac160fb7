// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: End-to-end tests for vault-gated configuration loading.
// Author: Lukas Bower
#![forbid(unsafe_code)]

use bootvault::{load_config, parse_config, ConfigError, VaultMode, CONFIG_PATH};
use ed25519_dalek::SigningKey;
use signature::Signer;
use storage_vault::{
    sha256, MemoryFileSystem, StorageContext, StorageError, VaultKey, VaultManifest, VAULT_PATH,
    VAULT_SIGNATURE_PATH,
};

fn config_with_vault_mode(mode: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>#WARNING</key>
	<string>edit with care</string>
	<key>Kernel</key>
	<dict>
		<key>Add</key>
		<array>
			<dict>
				<key>BundlePath</key>
				<string>Lilu.kext</string>
				<key>Enabled</key>
				<true/>
				<key>ExecutablePath</key>
				<string>Contents/MacOS/Lilu</string>
				<key>PlistPath</key>
				<string>Contents/Info.plist</string>
			</dict>
			<dict>
				<key>Arch</key>
				<string>x86_64</string>
				<key>BundlePath</key>
				<string>VirtualSMC.kext</string>
				<key>Enabled</key>
				<false/>
				<key>PlistPath</key>
				<string>Contents/Info.plist</string>
			</dict>
		</array>
	</dict>
	<key>Misc</key>
	<dict>
		<key>Debug</key>
		<dict>
			<key>DisplayLevel</key>
			<integer>2147483650</integer>
			<key>Target</key>
			<integer>3</integer>
		</dict>
		<key>Security</key>
		<dict>
			<key>ScanPolicy</key>
			<integer>0</integer>
			<key>Vault</key>
			<string>{mode}</string>
		</dict>
	</dict>
	<key>NVRAM</key>
	<dict>
		<key>Add</key>
		<dict>
			<key>7C436110-AB2A-4BBB-A880-FE41995C9F82</key>
			<dict>
				<key>boot-args</key>
				<string>-v</string>
				<key>csr-active-config</key>
				<data>AAAAAA==</data>
			</dict>
		</dict>
		<key>Delete</key>
		<dict>
			<key>7C436110-AB2A-4BBB-A880-FE41995C9F82</key>
			<array>
				<string>boot-args</string>
			</array>
		</dict>
		<key>WriteFlash</key>
		<true/>
	</dict>
	<key>UEFI</key>
	<dict>
		<key>Drivers</key>
		<array>
			<string>OpenRuntime.efi</string>
			<string>HfsPlus.efi</string>
		</array>
		<key>Unknown</key>
		<true/>
	</dict>
</dict>
</plist>
"#
    )
}

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

fn volume(config: &str, vaulted: bool, signed: bool) -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    fs.insert(CONFIG_PATH, config.as_bytes().to_vec());
    if vaulted {
        let mut manifest = VaultManifest::new();
        manifest.insert(CONFIG_PATH, sha256(config.as_bytes()));
        let manifest = manifest.to_plist();
        if signed {
            let signature = signing_key().sign(&sha256(manifest.as_bytes()));
            fs.insert(VAULT_SIGNATURE_PATH, signature.to_bytes().to_vec());
        }
        fs.insert(VAULT_PATH, manifest.into_bytes());
    }
    fs
}

#[test]
fn parses_every_section() {
    let (config, issues) = parse_config(config_with_vault_mode("Optional").as_bytes()).unwrap();
    // UEFI.Unknown only.
    assert_eq!(issues, 1);

    let kexts: Vec<_> = config.kernel.add.iter().collect();
    assert_eq!(kexts.len(), 2);
    assert_eq!(kexts[0].bundle_path.as_str(), Some("Lilu.kext"));
    assert_eq!(kexts[0].arch.as_str(), Some("Any"));
    assert!(kexts[0].enabled);
    assert_eq!(kexts[1].arch.as_str(), Some("x86_64"));
    assert!(kexts[1].executable_path.is_empty());

    assert_eq!(config.misc.debug.display_level, 2_147_483_650);
    assert_eq!(config.misc.debug.target, 3);
    assert_eq!(config.misc.security.scan_policy, 0);
    // Absent keys keep their defaults.
    assert_eq!(config.misc.security.halt_level, 0x8000_0000);
    assert_eq!(config.misc.security.secure_boot_model.as_str(), Some("Default"));

    let apple = config
        .nvram
        .add
        .get("7C436110-AB2A-4BBB-A880-FE41995C9F82")
        .unwrap();
    assert_eq!(apple.get("boot-args").map(|v| v.as_bytes()), Some(&b"-v\0"[..]));
    assert_eq!(
        apple.get("csr-active-config").map(|v| v.as_bytes()),
        Some(&[0u8; 4][..])
    );
    let deleted = config
        .nvram
        .delete
        .get("7C436110-AB2A-4BBB-A880-FE41995C9F82")
        .unwrap();
    assert_eq!(deleted.get(0).and_then(|v| v.as_str()), Some("boot-args"));
    assert!(config.nvram.write_flash);

    let drivers: Vec<_> = config.uefi.drivers.iter().filter_map(|d| d.as_str()).collect();
    assert_eq!(drivers, ["OpenRuntime.efi", "HfsPlus.efi"]);
}

#[test]
fn non_plist_configuration_is_malformed() {
    assert_eq!(parse_config(b"<array/>").unwrap_err(), ConfigError::Malformed);
}

#[test]
fn secure_mode_loads_from_signed_vault() {
    let fs = volume(&config_with_vault_mode("Secure"), true, true);
    let key = signing_key().verifying_key();
    let storage = StorageContext::init_from_filesystem(&fs, "", Some(&key as &dyn VaultKey))
        .expect("init");
    let loaded = load_config(&storage, true).expect("load");
    assert_eq!(loaded.vault_mode, VaultMode::Secure);
    assert_eq!(loaded.issues, 1);
    assert_eq!(loaded.config.uefi.drivers.len(), 2);
}

#[test]
fn secure_mode_without_key_is_refused() {
    let fs = volume(&config_with_vault_mode("Secure"), true, false);
    let storage = StorageContext::init_from_filesystem(&fs, "", None).expect("init");
    assert_eq!(
        load_config(&storage, false).unwrap_err(),
        ConfigError::SignatureRequired
    );
}

#[test]
fn basic_mode_requires_a_vault() {
    let fs = volume(&config_with_vault_mode("Basic"), false, false);
    let storage = StorageContext::init_from_filesystem(&fs, "", None).expect("init");
    assert_eq!(
        load_config(&storage, false).unwrap_err(),
        ConfigError::VaultRequired(VaultMode::Basic)
    );

    let fs = volume(&config_with_vault_mode("Basic"), true, false);
    let storage = StorageContext::init_from_filesystem(&fs, "", None).expect("init");
    assert_eq!(load_config(&storage, false).expect("load").vault_mode, VaultMode::Basic);
}

#[test]
fn optional_mode_loads_unvaulted() {
    let fs = volume(&config_with_vault_mode("Optional"), false, false);
    let storage = StorageContext::init_from_filesystem(&fs, "", None).expect("init");
    assert_eq!(
        load_config(&storage, false).expect("load").vault_mode,
        VaultMode::Optional
    );
}

#[test]
fn unknown_vault_mode_is_rejected() {
    let fs = volume(&config_with_vault_mode("Paranoid"), false, false);
    let storage = StorageContext::init_from_filesystem(&fs, "", None).expect("init");
    assert_eq!(
        load_config(&storage, false).unwrap_err(),
        ConfigError::InvalidVaultMode("Paranoid".to_owned())
    );
}

#[test]
fn tampered_configuration_is_refused() {
    let config = config_with_vault_mode("Basic");
    let fs = volume(&config, true, false);
    fs.insert(CONFIG_PATH, config.replace("<integer>0</integer>", "<integer>1</integer>"));
    let storage = StorageContext::init_from_filesystem(&fs, "", None).expect("init");
    assert_eq!(
        load_config(&storage, false).unwrap_err(),
        ConfigError::Storage(StorageError::DigestMismatch(CONFIG_PATH.to_owned()))
    );
}
