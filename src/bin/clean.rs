// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxiadmin::{
    clean::{clean_all, CleanOptions, SystemCleaner},
    config::Settings,
    docker::DockerCli,
    logging,
    path::home_dir,
    syscall::HostSyscall,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::error;

/// Clean the system.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "clean",
    override_usage = "clean [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to settings file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::All(opts) => run_all(self.config, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Clean caches, logs, orphaned packages, and docker resources.
    #[command(override_usage = "clean all [options]")]
    All(AllOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author)]
struct AllOptions {
    /// Clean JetBrains applications' configurations.
    #[arg(long)]
    pub jetbrains: bool,

    /// Also clean the system-space using bleachbit as root.
    #[arg(long)]
    pub bleachbit_root: bool,
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

fn run_all(config: Option<PathBuf>, opts: AllOptions) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;
    let cleaner = SystemCleaner::new(HostSyscall, settings.clean);
    let docker = DockerCli::new(HostSyscall);
    let opts = CleanOptions {
        bleachbit_root: opts.bleachbit_root,
        jetbrains: opts.jetbrains,
    };

    clean_all(&cleaner, &docker, home_dir()?, opts)?;

    Ok(())
}
