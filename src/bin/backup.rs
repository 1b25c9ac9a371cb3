// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxiadmin::{
    backup::{default_archive_name, BackupManifest, BackupRunner},
    config::Settings,
    logging,
};

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::{env::current_dir, path::PathBuf, process::exit, time::Duration};
use tracing::{error, info};

/// Backup important files into a compressed archive.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "backup",
    override_usage = "backup [options] <command>",
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
        let runner = BackupRunner::new(BackupManifest::from(&settings.backup));
        match self.command {
            Command::All(opts) => run_all(runner, opts),
            Command::List => run_list(runner),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Backup all the necessary files.
    #[command(override_usage = "backup all [options]")]
    All(AllOptions),

    /// List all the files to back up.
    #[command(override_usage = "backup list")]
    List,
}

#[derive(Parser, Clone, Debug)]
#[command(author)]
struct AllOptions {
    /// Directory which will contain the archive [default: current directory].
    #[arg(short, long, value_name = "path")]
    pub destination: Option<PathBuf>,

    /// Name of the archive [default: backup__YYYY_MM_DD.tar.gz].
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

fn run_all(runner: BackupRunner, opts: AllOptions) -> Result<()> {
    let destination = match opts.destination {
        Some(destination) => destination,
        None => current_dir()?,
    };
    let filename = match opts.filename {
        Some(filename) => filename,
        None => default_archive_name(Local::now().date_naive()),
    };

    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}] {pos}/{len}",
    )?
    .progress_chars("-Cco.");
    let bar = ProgressBar::new(runner.manifest().len() as u64).with_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    let result = runner.run(destination, filename, &bar);
    bar.finish_and_clear();
    let target = result?;
    info!("archive written to {}", target.as_path().display());

    Ok(())
}

fn run_list(runner: BackupRunner) -> Result<()> {
    info!("the following files/directories will be backed up:");
    for path in runner.list() {
        println!("{}", path.display());
    }

    Ok(())
}
