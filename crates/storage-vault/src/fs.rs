// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Filesystem capability consumed by the storage vault.
// Author: Lukas Bower

//! Directory access.
//!
//! Paths handed to a [`Directory`] are relative and may use `\` separators as
//! boot volumes do; adapters translate them as needed.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;
use thiserror::Error;

/// Errors reported by filesystem adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// No file or directory at the path.
    #[error("not found")]
    NotFound,
    /// The adapter refused access.
    #[error("access denied")]
    AccessDenied,
    /// Any other I/O failure.
    #[error("i/o error: {0}")]
    Io(String),
}

/// A volume that can open directories.
pub trait FileSystem {
    /// Directory handle produced by [`FileSystem::open_root`].
    type Directory: Directory;

    /// Open the directory at `path` as the storage root.
    fn open_root(&self, path: &str) -> Result<Self::Directory, FsError>;
}

/// An open directory.
pub trait Directory {
    /// Read the whole file at `path`.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Whether a file exists at `path`.
    fn file_exists(&self, path: &str) -> bool;
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').into()
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    reads: usize,
}

/// In-memory volume shared between clones.
///
/// Every [`Directory::read_file`] call is counted, including failed ones.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFileSystem {
    /// Empty volume.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` at `path`, replacing any previous file.
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.state.lock().files.insert(normalize(path), bytes.into());
    }

    /// Remove the file at `path`.
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.remove(&normalize(path))
    }

    /// Copy of the file at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(&normalize(path)).cloned()
    }

    /// Number of file reads attempted so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }
}

impl FileSystem for MemoryFileSystem {
    type Directory = MemoryDirectory;

    fn open_root(&self, path: &str) -> Result<Self::Directory, FsError> {
        let prefix = normalize(path);
        if !prefix.is_empty() {
            let nested = alloc::format!("{prefix}/");
            let state = self.state.lock();
            if !state.files.keys().any(|name| name.starts_with(&nested)) {
                return Err(FsError::NotFound);
            }
        }
        Ok(MemoryDirectory {
            state: Arc::clone(&self.state),
            prefix,
        })
    }
}

/// Directory of a [`MemoryFileSystem`].
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    state: Arc<Mutex<MemoryState>>,
    prefix: String,
}

impl MemoryDirectory {
    fn full_path(&self, path: &str) -> String {
        let path = normalize(path);
        if self.prefix.is_empty() {
            path
        } else {
            alloc::format!("{}/{}", self.prefix, path)
        }
    }
}

impl Directory for MemoryDirectory {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let full = self.full_path(path);
        let mut state = self.state.lock();
        state.reads += 1;
        state.files.get(&full).cloned().ok_or(FsError::NotFound)
    }

    fn file_exists(&self, path: &str) -> bool {
        let full = self.full_path(path);
        self.state.lock().files.contains_key(&full)
    }
}

#[cfg(feature = "std")]
mod host {
    use super::{Directory, FileSystem, FsError};
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    /// Host filesystem adapter rooted at real directories.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct HostFileSystem;

    impl FileSystem for HostFileSystem {
        type Directory = HostDirectory;

        fn open_root(&self, path: &str) -> Result<Self::Directory, FsError> {
            let root = PathBuf::from(path);
            match std::fs::metadata(&root) {
                Ok(meta) if meta.is_dir() => Ok(HostDirectory { root }),
                Ok(_) => Err(FsError::NotFound),
                Err(err) => Err(map_io(&err)),
            }
        }
    }

    /// Directory on the host filesystem.
    #[derive(Debug, Clone)]
    pub struct HostDirectory {
        root: PathBuf,
    }

    impl HostDirectory {
        /// Root directory path.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.root
        }

        fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
            let mut resolved = self.root.clone();
            for part in path.split(['\\', '/']).filter(|part| !part.is_empty()) {
                if part == ".." {
                    log::warn!("[storage] refusing parent component path={path}");
                    return Err(FsError::AccessDenied);
                }
                resolved.push(part);
            }
            Ok(resolved)
        }
    }

    impl Directory for HostDirectory {
        fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
            std::fs::read(self.resolve(path)?).map_err(|err| map_io(&err))
        }

        fn file_exists(&self, path: &str) -> bool {
            self.resolve(path).is_ok_and(|resolved| resolved.is_file())
        }
    }

    fn map_io(err: &std::io::Error) -> FsError {
        match err.kind() {
            ErrorKind::NotFound => FsError::NotFound,
            ErrorKind::PermissionDenied => FsError::AccessDenied,
            _ => FsError::Io(err.to_string()),
        }
    }
}

#[cfg(feature = "std")]
pub use host::{HostDirectory, HostFileSystem};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_paths_accept_both_separators() {
        let fs = MemoryFileSystem::new();
        fs.insert("EFI\\OC\\config.plist", b"cfg".to_vec());
        let root = fs.open_root("EFI\\OC").unwrap();
        assert_eq!(root.read_file("config.plist").unwrap(), b"cfg");
        assert!(root.file_exists("config.plist"));
        let top = fs.open_root("").unwrap();
        assert_eq!(top.read_file("EFI/OC/config.plist").unwrap(), b"cfg");
        assert_eq!(fs.reads(), 2);
    }

    #[test]
    fn memory_missing_root_fails() {
        let fs = MemoryFileSystem::new();
        fs.insert("EFI/OC/config.plist", b"cfg".to_vec());
        assert_eq!(fs.open_root("EFI\\BOOT").unwrap_err(), FsError::NotFound);
    }

    #[test]
    fn memory_counts_failed_reads() {
        let fs = MemoryFileSystem::new();
        let root = fs.open_root("").unwrap();
        assert_eq!(root.read_file("absent").unwrap_err(), FsError::NotFound);
        assert!(!root.file_exists("absent"));
        assert_eq!(fs.reads(), 1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn host_directory_reads_files() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("ACPI")).unwrap();
        std::fs::write(temp.path().join("ACPI").join("SSDT.aml"), b"aml").unwrap();
        let root = HostFileSystem
            .open_root(temp.path().to_str().unwrap())
            .unwrap();
        assert_eq!(root.read_file("ACPI\\SSDT.aml").unwrap(), b"aml");
        assert!(root.file_exists("ACPI/SSDT.aml"));
        assert_eq!(root.read_file("missing").unwrap_err(), FsError::NotFound);
        assert_eq!(
            root.read_file("ACPI\\..\\..\\secret").unwrap_err(),
            FsError::AccessDenied
        );
        assert!(!root.file_exists("../ACPI/SSDT.aml"));
        let file = temp.path().join("ACPI").join("SSDT.aml");
        assert_eq!(
            HostFileSystem.open_root(file.to_str().unwrap()).unwrap_err(),
            FsError::NotFound
        );
    }
}
