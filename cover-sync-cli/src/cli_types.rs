//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cover-sync")]
#[command(about = "Write the cover image of each record folder into its database row", long_about = None)]
pub(crate) struct Cli {
    /// Root path containing one folder per record id
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for the sync command.
#[derive(Args, Clone)]
pub(crate) struct SyncArgs {
    /// SQLite database holding the record table
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Show the covers that would be written without touching the database
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Visit folders and files sorted by name instead of filesystem order
    #[arg(long)]
    pub sorted: bool,

    /// Report failing folders and keep going instead of stopping
    #[arg(long)]
    pub continue_on_error: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Find each record folder's cover and write it to the database
    Sync(SyncArgs),

    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show effective settings and their sources
    Show,

    /// Print the settings file path
    Path,

    /// Write a default settings file if none exists
    Init,
}
