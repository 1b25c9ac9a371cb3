// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! System cleaning.
//!
//! Cleaning is spread across several tools: bleachbit for caches and
//! histories, journalctl for old logs, pacman and yaourt for orphaned
//! packages and package caches, and the container runtime for whatever
//! docker has piled up. JetBrains IDEs also leave configuration behind all
//! over the home directory, which can optionally be swept too.
//!
//! Steps that are required to succeed fail the whole clean. The package
//! manager steps only report trouble, and move on.

use crate::{
    config::CleanSettings,
    docker::{ContainerRuntime, DockerError},
    syscall::{tokens, Invocation, Syscall, SyscallError},
};

use std::{
    fs::remove_dir_all,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Layer of indirection for package and cache cleaning tools.
pub trait PackageCleaner {
    /// Clean caches through bleachbit, optionally as root.
    fn bleachbit(&self, privileged: bool) -> Result<()>;

    /// Vacuum old systemd journal entries.
    fn vacuum_journal(&self) -> Result<()>;

    /// Remove orphans and caches of pacman.
    fn clean_pacman(&self) -> Result<()>;

    /// Report orphans of yaourt.
    fn clean_yaourt(&self) -> Result<()>;
}

/// Package and cache cleaning through host tools.
#[derive(Debug)]
pub struct SystemCleaner<S>
where
    S: Syscall,
{
    syscall: S,
    settings: CleanSettings,
}

impl<S> SystemCleaner<S>
where
    S: Syscall,
{
    /// Construct new cleaner.
    pub fn new(syscall: S, settings: CleanSettings) -> Self {
        Self { syscall, settings }
    }

    fn passthrough(&self, call: Invocation) {
        if let Err(error) = self.syscall.interactive(&call) {
            warn!("{error}");
        }
    }
}

impl<S> PackageCleaner for SystemCleaner<S>
where
    S: Syscall,
{
    #[instrument(skip(self), level = "debug")]
    fn bleachbit(&self, privileged: bool) -> Result<()> {
        let space = if privileged { "system" } else { "user" };
        let available = self
            .syscall
            .capture(&Invocation::new("bleachbit").arg("--list-cleaners"))?;
        let cleaners = tokens(&available)
            .into_iter()
            .filter(|cleaner| !self.settings.excluded_cleaners.contains(cleaner));

        let mut call = Invocation::new("bleachbit").arg("--clean").args(cleaners);
        if privileged {
            call = call.sudo();
        }

        info!("cleaning the {space}-space using bleachbit...");
        self.syscall.interactive(&call)?;
        info!("cleaned the {space}-space using bleachbit");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn vacuum_journal(&self) -> Result<()> {
        info!("cleaning journalctl...");
        let call = Invocation::new("journalctl")
            .arg(format!("--vacuum-time={}", self.settings.journal_vacuum_time))
            .arg(format!("--vacuum-size={}", self.settings.journal_vacuum_size))
            .sudo();
        self.syscall.interactive(&call)?;
        info!("cleaned journalctl");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn clean_pacman(&self) -> Result<()> {
        info!("removing pacman's orphan packages...");

        // INVARIANT: Pacman exits non-zero when there are no orphans at all.
        let orphans = match self.syscall.capture(&Invocation::new("pacman").arg("-Qdtq")) {
            Ok(output) => tokens(&output),
            Err(SyscallError::Failed { .. }) => Vec::new(),
            Err(error) => return Err(error.into()),
        };

        if orphans.is_empty() {
            info!("no orphan packages to remove");
        } else {
            debug!("orphans: {orphans:?}");
            self.passthrough(Invocation::new("pacman").arg("-Rs").args(orphans).sudo());
        }

        info!("clearing pacman's cache...");
        self.passthrough(Invocation::new("pacman").arg("-Scc").sudo());

        info!("viewing pacdiff...");
        self.passthrough(Invocation::new("pacdiff").sudo());

        info!("cleaned pacman");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn clean_yaourt(&self) -> Result<()> {
        info!("listing yaourt's orphan packages...");
        self.passthrough(Invocation::new("yaourt").arg("-Qdtq"));

        Ok(())
    }
}

/// Optional steps of a full clean.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    /// Run bleachbit as root before running it as the user.
    pub bleachbit_root: bool,

    /// Remove JetBrains application configurations.
    pub jetbrains: bool,
}

/// Run every cleaning step in order.
///
/// # Errors
///
/// - Return [`CleanError`] of the first required step that fails.
pub fn clean_all(
    cleaner: &impl PackageCleaner,
    runtime: &impl ContainerRuntime,
    home: impl AsRef<Path>,
    opts: CleanOptions,
) -> Result<()> {
    if opts.bleachbit_root {
        cleaner.bleachbit(true)?;
    }

    cleaner.bleachbit(false)?;
    cleaner.vacuum_journal()?;
    cleaner.clean_pacman()?;
    cleaner.clean_yaourt()?;

    info!("purging all docker images, containers, networks, and volumes...");
    runtime.purge()?;

    if opts.jetbrains {
        remove_jetbrains_configs(home)?;
    }

    info!("system clean");
    Ok(())
}

/// Remove JetBrains application configurations from home directory.
///
/// Targets every `JetBrains` directory under a hidden top-level directory,
/// e.g., `~/.config/JetBrains` or `~/.local/share/JetBrains`, along with
/// `~/.java`. Returns removed paths.
///
/// # Errors
///
/// - Return [`CleanError::Pattern`] if home path makes for a bad pattern.
/// - Return [`CleanError::Remove`] if a directory cannot be removed.
#[instrument(skip(home), level = "debug")]
pub fn remove_jetbrains_configs(home: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    info!("removing JetBrains applications' configurations...");
    let home = home.as_ref();
    let pattern = home.join(".*/**/JetBrains");
    let mut targets = glob::glob(pattern.to_string_lossy().as_ref())?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();

    let java = home.join(".java");
    if java.is_dir() {
        targets.push(java);
    }

    let mut removed = Vec::new();
    for path in targets {
        // INVARIANT: Nested matches vanish along with their parent.
        if !path.exists() {
            continue;
        }

        debug!("remove {:?}", path.display());
        remove_dir_all(&path).map_err(|source| CleanError::Remove {
            source,
            path: path.clone(),
        })?;
        removed.push(path);
    }

    info!("removed JetBrains applications' configurations");
    Ok(removed)
}

/// Cleaning error types.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    /// Cleaning tool call failed.
    #[error(transparent)]
    Syscall(#[from] SyscallError),

    /// Container runtime purge failed.
    #[error(transparent)]
    Docker(#[from] DockerError),

    /// Search pattern is malformed.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Directory cannot be removed.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = CleanError> = std::result::Result<T, E>;
