// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxiadmin::{
    docker::{ContainerRuntime, DockerCli},
    logging,
    syscall::HostSyscall,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::exit;
use tracing::error;

/// High-level docker management.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "docker-utilities",
    override_usage = "docker-utilities <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let docker = DockerCli::new(HostSyscall);
        match self.command {
            Command::Purge => docker.purge()?,
            Command::Status => docker.status()?,
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Purge all docker images, containers, volumes, and networks.
    Purge,

    /// Show all docker images, containers, volumes, and networks.
    Status,
}

fn main() {
    logging::init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}
