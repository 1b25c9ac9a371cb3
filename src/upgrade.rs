// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! System upgrade.

use crate::syscall::{Invocation, Syscall, SyscallError};

use tracing::{info, instrument};

/// Layer of indirection for package upgrade tools.
pub trait PackageUpgrader {
    /// Rank and refresh package mirrors.
    fn refresh_mirrors(&self) -> Result<()>;

    /// Upgrade packages from official repositories.
    fn upgrade_system(&self) -> Result<()>;

    /// Upgrade packages from the AUR.
    fn upgrade_aur(&self) -> Result<()>;
}

/// Package upgrades through pacman and pacaur.
#[derive(Debug, Default)]
pub struct PacmanUpgrader<S>
where
    S: Syscall,
{
    syscall: S,
}

impl<S> PacmanUpgrader<S>
where
    S: Syscall,
{
    pub fn new(syscall: S) -> Self {
        Self { syscall }
    }
}

impl<S> PackageUpgrader for PacmanUpgrader<S>
where
    S: Syscall,
{
    fn refresh_mirrors(&self) -> Result<()> {
        info!("refreshing pacman's mirrors...");
        Ok(self
            .syscall
            .interactive(&Invocation::new("pacman-mirrors").arg("-f").sudo())?)
    }

    fn upgrade_system(&self) -> Result<()> {
        info!("upgrading pacman packages...");
        Ok(self
            .syscall
            .interactive(&Invocation::new("pacman").arg("-Syyu").sudo())?)
    }

    fn upgrade_aur(&self) -> Result<()> {
        info!("upgrading AUR packages...");
        Ok(self
            .syscall
            .interactive(&Invocation::new("pacaur").arg("-Syuua"))?)
    }
}

/// Upgrade everything, optionally refreshing mirrors first.
///
/// # Errors
///
/// - Return [`UpgradeError`] of the first step that fails.
#[instrument(skip(upgrader), level = "debug")]
pub fn upgrade_all(upgrader: &impl PackageUpgrader, refresh_mirrors: bool) -> Result<()> {
    info!("starting upgrade...");
    if refresh_mirrors {
        upgrader.refresh_mirrors()?;
    }

    upgrader.upgrade_system()?;
    upgrader.upgrade_aur()?;
    info!("upgrade complete");

    Ok(())
}

/// Upgrade error types.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// Upgrade tool call failed.
    #[error(transparent)]
    Syscall(#[from] SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = UpgradeError> = std::result::Result<T, E>;
