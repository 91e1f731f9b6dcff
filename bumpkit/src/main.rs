mod commands;
mod formatting;

use std::path::PathBuf;

use anyhow::Result;
use bumpkit_core::VersionOptions;
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "bumpkit")]
#[command(about = "Changeset-driven releases for multi-package repositories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root; all relative paths are resolved against it.
    #[arg(long, global = true, default_value = ".")]
    cwd: PathBuf,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, global = true, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending changesets: bump versions, write changelogs, commit.
    Version {
        /// Stage and commit the release (default unless configured otherwise).
        #[arg(long, action, conflicts_with = "no_commit")]
        commit: bool,
        /// Leave every change in the working tree for manual review.
        #[arg(long, action)]
        no_commit: bool,
        /// Add `[skip ci]` to the release commit message.
        #[arg(long, action, conflicts_with = "no_skip_ci")]
        skip_ci: bool,
        #[arg(long, action)]
        no_skip_ci: bool,
        /// Do not regenerate changelogs.
        #[arg(long, action)]
        no_changelog: bool,
    },
    /// Show the release the pending changesets would produce.
    Status {
        #[arg(long, action)]
        json: bool,
    },
}

/// Maps a `--flag` / `--no-flag` pair onto an optional override.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version {
            commit,
            no_commit,
            skip_ci,
            no_skip_ci,
            no_changelog,
        } => {
            let options = VersionOptions {
                commit: flag_pair(commit, no_commit),
                skip_ci: flag_pair(skip_ci, no_skip_ci),
                no_changelog: no_changelog.then_some(true),
            };
            commands::cmd_version(cli.cwd, options)?
        }
        Commands::Status { json } => commands::cmd_status(cli.cwd, json)?,
    }

    Ok(())
}
