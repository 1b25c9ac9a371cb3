// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Container resource management.
//!
//! High-level view over the resources a container runtime keeps around:
//! containers, volumes, images, and networks. They can either be listed, or
//! purged in full.

use crate::syscall::{tokens, Invocation, Syscall, SyscallError};

use tracing::{info, instrument, warn};

/// Layer of indirection for container runtime access.
pub trait ContainerRuntime {
    /// Show every container, volume, image, and network.
    ///
    /// A listing that fails is reported, and the remaining ones still run.
    fn status(&self) -> Result<()>;

    /// Stop and remove every container, volume, image, and network.
    fn purge(&self) -> Result<()>;
}

/// Container runtime access through the docker binary.
#[derive(Debug, Default)]
pub struct DockerCli<S>
where
    S: Syscall,
{
    pub(crate) syscall: S,
}

impl<S> DockerCli<S>
where
    S: Syscall,
{
    /// Construct new docker front end.
    pub fn new(syscall: S) -> Self {
        Self { syscall }
    }

    fn docker(args: &[&str]) -> Invocation {
        Invocation::new("docker").args(args.iter().copied())
    }

    fn list_ids(&self, args: &[&str]) -> Result<Vec<String>> {
        Ok(tokens(&self.syscall.capture(&Self::docker(args))?))
    }

    fn each(&self, ids: &[String], args: &[&str]) {
        for id in ids {
            let call = Self::docker(args).arg(id);
            if let Err(error) = self.syscall.interactive(&call) {
                warn!("{error}");
            }
        }
    }
}

impl<S> ContainerRuntime for DockerCli<S>
where
    S: Syscall,
{
    #[instrument(skip(self), level = "debug")]
    fn status(&self) -> Result<()> {
        let sections: [(&str, &[&str]); 4] = [
            ("Containers", &["container", "ls", "--all"]),
            ("Volumes", &["volume", "ls"]),
            ("Images", &["image", "ls", "--all"]),
            ("Networks", &["network", "ls"]),
        ];

        for (heading, args) in sections {
            info!("** {heading} **");
            if let Err(error) = self.syscall.interactive(&Self::docker(args)) {
                warn!("{error}");
            }
            println!();
        }

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn purge(&self) -> Result<()> {
        let containers = self.list_ids(&["container", "ls", "--all", "--quiet"])?;
        info!("stopping all containers...");
        self.each(&containers, &["container", "stop"]);
        info!("removing all containers...");
        self.each(&containers, &["container", "rm", "--force"]);

        let volumes = self.list_ids(&["volume", "ls", "--quiet"])?;
        info!("removing all volumes...");
        self.each(&volumes, &["volume", "rm", "--force"]);

        let images = self.list_ids(&["image", "ls", "--all", "--quiet"])?;
        info!("removing all images...");
        self.each(&images, &["image", "rm", "--force"]);

        let networks = self.list_ids(&["network", "ls", "--quiet"])?;
        info!("removing all networks...");
        self.each(&networks, &["network", "rm"]);

        info!("purged all docker images, containers, networks, and volumes");
        Ok(())
    }
}

/// Container runtime error types.
#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    /// Docker binary call failed.
    #[error(transparent)]
    Syscall(#[from] SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = DockerError> = std::result::Result<T, E>;
