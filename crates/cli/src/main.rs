//! Snapkeep CLI - snapkeep command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod cmd;
mod util;

/// Snapkeep - dated snapshots with tiered retention
#[derive(Parser)]
#[command(name = "snapkeep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: search the standard locations)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show what would change without touching storage
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// More output (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new snapshot and sync the configured sources into it
    Snap,
    /// Apply the retention policy to every snapshot
    Rotate {
        /// Rotation action (report, remove, relocate, archive)
        #[arg(short, long)]
        action: Option<String>,
    },
    /// Run the retention policy over random snapshot dates
    Test {
        /// Number of synthetic snapshots
        count: String,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List snapshots whose path matches a regular expression
    Find {
        pattern: String,
    },
    /// Delete every snapshot whose path matches, ignoring retention
    Remove {
        pattern: String,
    },
    /// Print the effective settings
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = util::load_settings(cli.config.as_deref(), cli.dry_run)?;
    init_logging(cli.verbose, settings.verbose);

    match cli.command {
        Commands::Snap => cmd::snap::run(&settings),
        Commands::Rotate { action } => cmd::rotate::run(&settings, action.as_deref()),
        Commands::Test { count, seed } => cmd::simulate::run(&settings, &count, seed),
        Commands::Find { pattern } => cmd::find::run(&settings, &pattern),
        Commands::Remove { pattern } => cmd::remove::run(&settings, &pattern),
        Commands::Config => cmd::config::run(&settings),
    }
}

fn init_logging(verbosity: u8, configured_verbose: bool) {
    let level = match verbosity {
        0 if configured_verbose => Level::INFO,
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
