// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Typed boot configuration and its plist schema.
// Author: Lukas Bower

use alloc::vec;

use plist_schema::{Blob, DictSchema, FieldSchema, List, Map};
use spin::Lazy;

/// Top-level boot configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootConfig {
    /// `Kernel` section.
    pub kernel: KernelSection,
    /// `Misc` section.
    pub misc: MiscSection,
    /// `NVRAM` section.
    pub nvram: NvramSection,
    /// `UEFI` section.
    pub uefi: UefiSection,
}

/// `Kernel` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelSection {
    /// Kernel extensions to inject, in load order.
    pub add: List<KernelAddEntry>,
}

/// One `Kernel.Add` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelAddEntry {
    /// Architecture filter, `Any` by default.
    pub arch: Blob,
    /// Bundle path relative to the kext directory.
    pub bundle_path: Blob,
    /// Free-form comment.
    pub comment: Blob,
    /// Whether the entry is used.
    pub enabled: bool,
    /// Executable path inside the bundle.
    pub executable_path: Blob,
    /// Highest kernel version the entry applies to.
    pub max_kernel: Blob,
    /// Lowest kernel version the entry applies to.
    pub min_kernel: Blob,
    /// Info.plist path inside the bundle.
    pub plist_path: Blob,
}

impl Default for KernelAddEntry {
    fn default() -> Self {
        Self {
            arch: Blob::from("Any"),
            bundle_path: Blob::new(),
            comment: Blob::new(),
            enabled: false,
            executable_path: Blob::new(),
            max_kernel: Blob::new(),
            min_kernel: Blob::new(),
            plist_path: Blob::new(),
        }
    }
}

/// `Misc` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiscSection {
    /// `Misc.Debug`.
    pub debug: DebugSettings,
    /// `Misc.Security`.
    pub security: SecuritySettings,
}

/// `Misc.Debug`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugSettings {
    /// Forward boot.efi debug output.
    pub apple_debug: bool,
    /// Delay in microseconds after each printed line.
    pub display_delay: u32,
    /// Debug message mask.
    pub display_level: u64,
    /// Logging target mask.
    pub target: u8,
}

/// `Misc.Security`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuritySettings {
    /// Allow changing the default boot entry from the picker.
    pub allow_set_default: bool,
    /// Sensitive data exposure mask.
    pub expose_sensitive_data: u8,
    /// Debug level that halts execution.
    pub halt_level: u32,
    /// SHA-512 password hash.
    pub password_hash: [u8; 64],
    /// Password salt.
    pub password_salt: Blob,
    /// Scan policy mask.
    pub scan_policy: u32,
    /// Secure boot model identifier.
    pub secure_boot_model: Blob,
    /// Vault mode name, see [`crate::VaultMode`].
    pub vault: Blob,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            allow_set_default: false,
            expose_sensitive_data: 0x6,
            halt_level: 0x8000_0000,
            password_hash: [0; 64],
            password_salt: Blob::new(),
            scan_policy: 0x010F_0103,
            secure_boot_model: Blob::from("Default"),
            vault: Blob::from("Secure"),
        }
    }
}

/// `NVRAM` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NvramSection {
    /// Variables to set, keyed by vendor GUID then variable name.
    pub add: Map<Map<Blob>>,
    /// Variable names to delete, keyed by vendor GUID.
    pub delete: Map<List<Blob>>,
    /// Persist changes to flash.
    pub write_flash: bool,
}

/// `UEFI` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UefiSection {
    /// Connect controllers after loading drivers.
    pub connect_drivers: bool,
    /// Driver paths to load, in order.
    pub drivers: List<Blob>,
}

fn kernel_add_schema() -> DictSchema<KernelAddEntry> {
    DictSchema::new(vec![
        FieldSchema::string("Arch", |e: &mut KernelAddEntry| &mut e.arch).optional(),
        FieldSchema::string("BundlePath", |e: &mut KernelAddEntry| &mut e.bundle_path),
        FieldSchema::string("Comment", |e: &mut KernelAddEntry| &mut e.comment).optional(),
        FieldSchema::boolean("Enabled", |e: &mut KernelAddEntry| &mut e.enabled),
        FieldSchema::string("ExecutablePath", |e: &mut KernelAddEntry| &mut e.executable_path)
            .optional(),
        FieldSchema::string("MaxKernel", |e: &mut KernelAddEntry| &mut e.max_kernel).optional(),
        FieldSchema::string("MinKernel", |e: &mut KernelAddEntry| &mut e.min_kernel).optional(),
        FieldSchema::string("PlistPath", |e: &mut KernelAddEntry| &mut e.plist_path),
    ])
}

fn kernel_schema() -> DictSchema<KernelSection> {
    DictSchema::new(vec![FieldSchema::array(
        "Add",
        |k: &mut KernelSection| &mut k.add,
        FieldSchema::entry(kernel_add_schema()),
    )
    .optional()])
}

fn debug_schema() -> DictSchema<DebugSettings> {
    DictSchema::new(vec![
        FieldSchema::boolean("AppleDebug", |d: &mut DebugSettings| &mut d.apple_debug).optional(),
        FieldSchema::integer("DisplayDelay", |d: &mut DebugSettings| &mut d.display_delay)
            .optional(),
        FieldSchema::integer("DisplayLevel", |d: &mut DebugSettings| &mut d.display_level)
            .optional(),
        FieldSchema::integer("Target", |d: &mut DebugSettings| &mut d.target).optional(),
    ])
}

fn security_schema() -> DictSchema<SecuritySettings> {
    DictSchema::new(vec![
        FieldSchema::boolean("AllowSetDefault", |s: &mut SecuritySettings| {
            &mut s.allow_set_default
        })
        .optional(),
        FieldSchema::integer("ExposeSensitiveData", |s: &mut SecuritySettings| {
            &mut s.expose_sensitive_data
        })
        .optional(),
        FieldSchema::integer("HaltLevel", |s: &mut SecuritySettings| &mut s.halt_level)
            .optional(),
        FieldSchema::fixed_data("PasswordHash", |s: &mut SecuritySettings| {
            &mut s.password_hash
        })
        .optional(),
        FieldSchema::data("PasswordSalt", |s: &mut SecuritySettings| &mut s.password_salt)
            .optional(),
        FieldSchema::integer("ScanPolicy", |s: &mut SecuritySettings| &mut s.scan_policy)
            .optional(),
        FieldSchema::string("SecureBootModel", |s: &mut SecuritySettings| {
            &mut s.secure_boot_model
        })
        .optional(),
        FieldSchema::string("Vault", |s: &mut SecuritySettings| &mut s.vault).optional(),
    ])
}

fn misc_schema() -> DictSchema<MiscSection> {
    DictSchema::new(vec![
        FieldSchema::dict("Debug", |m: &mut MiscSection| &mut m.debug, debug_schema()).optional(),
        FieldSchema::dict("Security", |m: &mut MiscSection| &mut m.security, security_schema())
            .optional(),
    ])
}

fn nvram_schema() -> DictSchema<NvramSection> {
    DictSchema::new(vec![
        FieldSchema::map(
            "Add",
            |n: &mut NvramSection| &mut n.add,
            FieldSchema::map(
                "",
                |vars: &mut Map<Blob>| vars,
                FieldSchema::metadata("", |value: &mut Blob| value),
            ),
        )
        .optional(),
        FieldSchema::map(
            "Delete",
            |n: &mut NvramSection| &mut n.delete,
            FieldSchema::array(
                "",
                |names: &mut List<Blob>| names,
                FieldSchema::string("", |name: &mut Blob| name),
            ),
        )
        .optional(),
        FieldSchema::boolean("WriteFlash", |n: &mut NvramSection| &mut n.write_flash).optional(),
    ])
}

fn uefi_schema() -> DictSchema<UefiSection> {
    DictSchema::new(vec![
        FieldSchema::boolean("ConnectDrivers", |u: &mut UefiSection| &mut u.connect_drivers)
            .optional(),
        FieldSchema::array(
            "Drivers",
            |u: &mut UefiSection| &mut u.drivers,
            FieldSchema::string("", |path: &mut Blob| path),
        )
        .optional(),
    ])
}

pub(crate) static CONFIG_SCHEMA: Lazy<DictSchema<BootConfig>> = Lazy::new(|| {
    DictSchema::new(vec![
        FieldSchema::dict("Kernel", |c: &mut BootConfig| &mut c.kernel, kernel_schema()),
        FieldSchema::dict("Misc", |c: &mut BootConfig| &mut c.misc, misc_schema()),
        FieldSchema::dict("NVRAM", |c: &mut BootConfig| &mut c.nvram, nvram_schema()),
        FieldSchema::dict("UEFI", |c: &mut BootConfig| &mut c.uefi, uefi_schema()),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sorted<T>(schema: &DictSchema<T>) {
        let keys: alloc::vec::Vec<&str> = schema.fields().iter().map(|f| f.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn schemas_are_sorted() {
        assert_sorted(&*CONFIG_SCHEMA);
        assert_sorted(&kernel_add_schema());
        assert_sorted(&debug_schema());
        assert_sorted(&security_schema());
        assert_sorted(&nvram_schema());
        assert_sorted(&uefi_schema());
    }

    #[test]
    fn defaults_request_secure_vault() {
        let config = BootConfig::default();
        assert_eq!(config.misc.security.vault.as_str(), Some("Secure"));
        assert_eq!(config.misc.security.scan_policy, 0x010F_0103);
        assert!(config.kernel.add.is_empty());
    }
}
