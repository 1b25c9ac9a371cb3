// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxiadmin::{
    logging,
    syscall::HostSyscall,
    upgrade::{upgrade_all, PacmanUpgrader},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::exit;
use tracing::error;

/// Upgrade the system, and its packages.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "upgrade",
    override_usage = "upgrade <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::All(opts) => run_all(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Upgrade the system.
    #[command(override_usage = "upgrade all [options]")]
    All(AllOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author)]
struct AllOptions {
    /// Refresh pacman's mirrors first.
    #[arg(long)]
    pub refresh_mirrors: bool,
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

fn run_all(opts: AllOptions) -> Result<()> {
    let upgrader = PacmanUpgrader::new(HostSyscall);
    upgrade_all(&upgrader, opts.refresh_mirrors)?;

    Ok(())
}
