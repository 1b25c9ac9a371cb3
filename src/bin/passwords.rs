// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxiadmin::{
    config::Settings,
    logging,
    passwords::{export, import, PassStore},
    syscall::HostSyscall,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{env::current_dir, path::PathBuf, process::exit};
use tracing::error;

/// Export and restore passwords.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "passwords",
    override_usage = "passwords [options] <command>",
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
        let settings = Settings::load(self.config.as_deref())?;
        let store = PassStore::new(&settings.passwords.store, HostSyscall);
        let default_filename = settings.passwords.filename;
        match self.command {
            Command::Import(opts) => {
                let source = dir_or_cwd(opts.from)?;
                import(&store, source, opts.filename.unwrap_or(default_filename))?;
            }
            Command::Export(opts) => {
                let destination = dir_or_cwd(opts.to)?;
                export(&store, destination, opts.filename.unwrap_or(default_filename))?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Import passwords from a cleartext file.
    #[command(override_usage = "passwords import [options]")]
    Import(ImportOptions),

    /// Export passwords to a cleartext file.
    #[command(override_usage = "passwords export [options]")]
    Export(ExportOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author)]
struct ImportOptions {
    /// Directory which contains the cleartext file [default: current directory].
    #[arg(long, value_name = "path")]
    pub from: Option<PathBuf>,

    /// Name of the cleartext file [default: passwords.txt].
    #[arg(short, long, value_name = "name")]
    pub filename: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author)]
struct ExportOptions {
    /// Directory which will contain the cleartext file [default: current directory].
    #[arg(long, value_name = "path")]
    pub to: Option<PathBuf>,

    /// Name of the cleartext file [default: passwords.txt].
    #[arg(short, long, value_name = "name")]
    pub filename: Option<String>,
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

fn dir_or_cwd(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => Ok(current_dir()?),
    }
}
