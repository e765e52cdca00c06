//! Emt CLI - console-variable and class-registry maintenance tool.
//!
//! This is the main entry point for the emt CLI application. It uses clap
//! for argument parsing and dispatches to the appropriate command handlers:
//! cvar operations against a config file, and queries over the built-in
//! demo class registry.

mod commands;
mod error;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::classes::run_dump_classes;
use commands::cvars::{run_get, run_list, run_set, run_toggle, run_unset, CvarArgs};
use error::{EmtError, Result};

/// Emt - Ember maintenance tool
///
/// Emt edits engine config files at the cvar level (get, set, unset,
/// toggle, list) and answers class-registry queries, without launching
/// the engine.
#[derive(Parser, Debug)]
#[command(name = "emt")]
#[command(author = "Ember Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Console-variable and class-registry maintenance", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "EMT_VERBOSE")]
    verbose: bool,

    /// Config file to operate on
    #[arg(short, long, global = true, env = "EMT_CONFIG", default_value = "engine.ini")]
    file: PathBuf,

    /// Disable color output
    #[arg(long, global = true, env = "EMT_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the emt CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a cvar's current value
    Get {
        /// Cvar name (case-insensitive)
        name: String,
    },

    /// Set a cvar, creating it if the config file does not know it
    Set {
        /// Cvar name (case-insensitive)
        name: String,
        /// New value; parsed per the cvar's kind
        value: String,
    },

    /// Remove an unsettable cvar from the config file
    Unset {
        /// Cvar name (case-insensitive)
        name: String,
    },

    /// Invert a boolean cvar
    Toggle {
        /// Cvar name (case-insensitive)
        name: String,
    },

    /// List cvars with their flags and values
    List {
        /// Only names containing this substring
        filter: Option<String>,
    },

    /// List the demo class registry
    DumpClasses {
        /// Root class to list from (case-insensitive)
        filter: Option<String>,

        /// Include the whole subtree, not just direct children
        #[arg(long)]
        all: bool,
    },
}

/// Main entry point for the emt CLI.
///
/// Parses command-line arguments, initializes logging, and dispatches to
/// the selected command handler. Policy rejections and unknown names exit
/// nonzero through the error path.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color)?;

    execute_command(cli.command, cli.file, cli.verbose).context("command failed")?;
    Ok(())
}

/// Initialize the logging system.
///
/// # Arguments
/// * `verbose` - Whether to enable verbose logging
/// * `no_color` - Whether to disable colored output
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| EmtError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Execute the selected command.
fn execute_command(command: Commands, file: PathBuf, verbose: bool) -> Result<()> {
    let args = CvarArgs { file, verbose };
    match command {
        Commands::Get { name } => run_get(args, &name),
        Commands::Set { name, value } => run_set(args, &name, &value),
        Commands::Unset { name } => run_unset(args, &name),
        Commands::Toggle { name } => run_toggle(args, &name),
        Commands::List { filter } => run_list(args, filter.as_deref()),
        Commands::DumpClasses { filter, all } => run_dump_classes(filter.as_deref(), all),
    }
}
