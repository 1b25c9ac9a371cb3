// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Output file resolution.
//!
//! Every file this crate produces, be it a backup archive or a cleartext
//! password export, lands in a directory picked by the user under a name
//! picked by the user. Both must obey the same rules: the directory must
//! already exist, and the file must not. Nothing is ever overwritten.

use std::{
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Resolved path of a file that is about to be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    path: PathBuf,
}

impl OutputTarget {
    /// Resolve output file inside destination directory.
    ///
    /// Pure check against the current state of the file system, nothing is
    /// created or deleted.
    ///
    /// # Errors
    ///
    /// - Return [`TargetError::InvalidDestination`] if destination is not an
    ///   existing directory.
    /// - Return [`TargetError::InvalidFilename`] if filename is not a plain
    ///   file name, i.e., it is absolute or names a subdirectory.
    /// - Return [`TargetError::TargetExists`] if file is already present.
    pub fn resolve(destination: impl AsRef<Path>, filename: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref();
        if !destination.is_dir() {
            return Err(TargetError::InvalidDestination {
                path: destination.to_path_buf(),
            });
        }

        // INVARIANT: Output file always lands directly inside destination.
        let filename = filename.as_ref();
        if filename.file_name() != Some(filename.as_os_str()) {
            return Err(TargetError::InvalidFilename {
                name: filename.to_path_buf(),
            });
        }

        let path = destination.join(filename);
        if path.symlink_metadata().is_ok() {
            return Err(TargetError::TargetExists { path });
        }

        Ok(Self { path })
    }

    /// Create output file with create-exclusive semantics.
    ///
    /// The file may have appeared between resolution and creation. That case
    /// is still reported as [`TargetError::TargetExists`] rather than
    /// truncating whatever is there now.
    ///
    /// # Errors
    ///
    /// - Return [`TargetError::TargetExists`] if file showed up in between.
    /// - Return [`TargetError::Create`] for any other I/O failure.
    pub fn create(&self) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => TargetError::TargetExists {
                    path: self.path.clone(),
                },
                _ => TargetError::Create {
                    source,
                    path: self.path.clone(),
                },
            })
    }

    /// Treat output target as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.path.as_path()
    }
}

/// Output file resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Destination is not an existing directory.
    #[error("destination {:?} is not an existing directory", path.display())]
    InvalidDestination { path: PathBuf },

    /// Output name is not a plain file name.
    #[error("file name {:?} must not hold any directory component", name.display())]
    InvalidFilename { name: PathBuf },

    /// Output file already exists.
    #[error("file {:?} already exists", path.display())]
    TargetExists { path: PathBuf },

    /// Output file cannot be created.
    #[error("failed to create {:?}", path.display())]
    Create {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = TargetError> = std::result::Result<T, E>;
