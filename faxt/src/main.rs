//! Faxt CLI - a small command-line front end for the `fgc` managed heap.
//!
//! Three subcommands mirror a heap's life cycle: `init` creates an empty
//! heap file, `build` parses a JSON document into one, and `convert`
//! reopens a heap file and writes its root value back out as JSON. Both
//! `build` and `convert` can run a collection before saving/converting.

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    build::{run_build, BuildArgs},
    convert::{run_convert, ConvertArgs},
    init::{run_init, InitArgs},
};
use config::Config;
use error::{FaxtError, Result};

/// Faxt - a CLI front end for the fgc managed heap
#[derive(Parser, Debug)]
#[command(name = "faxt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Create, build, and inspect fgc heap files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (also forwarded to fgc::HeapOptions::verbose)
    #[arg(short, long, global = true, env = "FAXT_VERBOSE")]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FAXT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the faxt CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new, empty heap file
    Init(InitCommand),

    /// Build a heap file from a JSON document
    Build(BuildCommand),

    /// Convert a heap file back to JSON
    Convert(ConvertCommand),
}

/// Arguments for the init subcommand.
#[derive(Parser, Debug)]
struct InitCommand {
    /// Path of the heap file to create (default: from config)
    path: Option<PathBuf>,

    /// Capacity, in bytes, of the new heap (default: from config)
    #[arg(long)]
    capacity: Option<usize>,

    /// Overwrite the path if a file already exists there
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the build subcommand.
#[derive(Parser, Debug)]
struct BuildCommand {
    /// JSON document to build the heap from
    input: PathBuf,

    /// Path to write the resulting heap file to (default: from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Capacity, in bytes, of the built heap (default: from config)
    #[arg(long)]
    capacity: Option<usize>,

    /// Run the garbage collector before saving
    #[arg(long)]
    gc: bool,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the convert subcommand.
#[derive(Parser, Debug)]
struct ConvertCommand {
    /// Heap file to reopen (default: from config)
    input: Option<PathBuf>,

    /// Path to write the JSON output to (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Capacity, in bytes, to reopen the heap with (default: from config)
    #[arg(long)]
    capacity: Option<usize>,

    /// Run the garbage collector before converting
    #[arg(long)]
    gc: bool,
}

/// Main entry point for the faxt CLI.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let config = load_config(cli.config.as_deref())?;
    execute_command(cli.command, cli.verbose, config)
}

/// Initialize the logging system.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    let subscriber = fmt::layer().with_target(false).with_thread_ids(false).with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| FaxtError::Config(format!("failed to initialize logging: {e}")))?;

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

/// Execute the selected command.
fn execute_command(command: Commands, verbose: bool, config: Config) -> Result<()> {
    match command {
        Commands::Init(args) => execute_init(args, verbose, &config),
        Commands::Build(args) => execute_build(args, verbose, &config),
        Commands::Convert(args) => execute_convert(args, verbose, &config),
    }
}

fn execute_init(args: InitCommand, verbose: bool, config: &Config) -> Result<()> {
    run_init(InitArgs {
        verbose: verbose || config.verbose,
        path: args.path.unwrap_or_else(|| PathBuf::from(&config.heap_path)),
        capacity: args.capacity.unwrap_or(config.heap_capacity),
        force: args.force,
    })
}

fn execute_build(args: BuildCommand, verbose: bool, config: &Config) -> Result<()> {
    run_build(BuildArgs {
        verbose: verbose || config.verbose,
        input: args.input,
        output: args.output.unwrap_or_else(|| PathBuf::from(&config.heap_path)),
        capacity: args.capacity.unwrap_or(config.heap_capacity),
        gc: args.gc,
        force: args.force,
    })
}

fn execute_convert(args: ConvertCommand, verbose: bool, config: &Config) -> Result<()> {
    run_convert(ConvertArgs {
        verbose: verbose || config.verbose,
        input: args.input.unwrap_or_else(|| PathBuf::from(&config.heap_path)),
        output: args.output,
        capacity: args.capacity.unwrap_or(config.heap_capacity),
        gc: args.gc,
    })
}
