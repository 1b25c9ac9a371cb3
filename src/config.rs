// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the settings file that every binary reads to
//! simplify the process of serialization and deserialization. Every section
//! is optional, missing fields fall back to the defaults that match a typical
//! Linux desktop home directory.
//!
//! # General Layout
//!
//! ```toml
//! [backup]
//! root = "~"
//! items = [".gnupg", ".ssh", "Storage/Documents"]
//!
//! [clean]
//! journal_vacuum_time = "30days"
//! journal_vacuum_size = "50M"
//! excluded_cleaners = ["system.free_disk_space", "system.memory"]
//!
//! [passwords]
//! store = "~/.password-store"
//! filename = "passwords.txt"
//! ```
//!
//! All path fields go through shell expansion, so `~` and `$VAR` may be used
//! freely.

use crate::path::default_config_path;

use serde::Deserialize;
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Top-level settings layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backup manifest settings.
    pub backup: BackupSettings,

    /// System cleaning settings.
    pub clean: CleanSettings,

    /// Password store settings.
    pub passwords: PasswordSettings,
}

impl Settings {
    /// Load settings from target path, or from the default location.
    ///
    /// An explicit path must exist. The default location is optional, such
    /// that built-in defaults are used when nothing is there.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ReadFile`] if settings file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if settings file is malformed.
    /// - Return [`ConfigError::ShellExpansion`] if path expansion fails.
    /// - Return [`ConfigError::NoWayHome`] if default location is unknown.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_path()?;
                if !path.exists() {
                    debug!("no settings at {:?}, using defaults", path.display());
                    return Settings::default().expand();
                }
                path
            }
        };

        debug!("load settings from {:?}", path.display());
        read_to_string(&path)
            .map_err(|source| ConfigError::ReadFile { source, path })?
            .parse()
    }

    /// Perform shell expansion on every path field.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if variable lookup fails.
    pub fn expand(mut self) -> Result<Self> {
        self.backup.root = expand_path(&self.backup.root)?;
        self.backup.items = self
            .backup
            .items
            .iter()
            .map(|item| expand_path(item))
            .collect::<Result<Vec<_>>>()?;
        self.passwords.store = expand_path(&self.passwords.store)?;

        Ok(self)
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on all path fields.
        settings.expand()
    }
}

/// Backup manifest settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Directory that archive entry names are made relative to.
    pub root: PathBuf,

    /// Ordered listing of files and directories to back up.
    ///
    /// Relative items are resolved against [`BackupSettings::root`].
    pub items: Vec<PathBuf>,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~"),
            items: [
                ".gnupg",
                ".password-store",
                ".ssh",
                ".vimrc",
                ".zshenv",
                ".zshrc",
                ".backup",
                "Storage/Documents",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

/// System cleaning settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(default)]
pub struct CleanSettings {
    /// Age limit handed to `journalctl --vacuum-time`.
    pub journal_vacuum_time: String,

    /// Size limit handed to `journalctl --vacuum-size`.
    pub journal_vacuum_size: String,

    /// Bleachbit cleaners that must never run.
    pub excluded_cleaners: Vec<String>,
}

impl Default for CleanSettings {
    fn default() -> Self {
        Self {
            journal_vacuum_time: "30days".into(),
            journal_vacuum_size: "50M".into(),
            excluded_cleaners: vec!["system.free_disk_space".into(), "system.memory".into()],
        }
    }
}

/// Password store settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    /// Root directory of the password store.
    pub store: PathBuf,

    /// Default name of the cleartext export file.
    pub filename: String,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            store: PathBuf::from("~/.password-store"),
            filename: "passwords.txt".into(),
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Settings file cannot be read.
    #[error("failed to read settings file at {:?}", path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Default settings location cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
