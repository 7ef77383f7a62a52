//! # iospec CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use iospec_cli::normalize::{run_normalize, NormalizeArgs};
use iospec_cli::process::{run_process, ProcessArgs};
use iospec_core::Direction;

/// Declarative input/output schemas for JSON-like documents.
///
/// Runs documents through the input or output pipeline of a configured
/// manager, and prints canonical schemas.
#[derive(Parser, Debug)]
#[command(name = "iospec", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Manager configuration file (YAML or JSON).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Coerce then verify a document with the input processor.
    ProcessInput(ProcessArgs),

    /// Verify then coerce a document with the output processor.
    ProcessOutput(ProcessArgs),

    /// Print the canonical form of a schema document.
    Normalize(NormalizeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("iospec CLI starting");

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::ProcessInput(args) => run_process(Direction::Input, &args, config),
        Commands::ProcessOutput(args) => run_process(Direction::Output, &args, config),
        Commands::Normalize(args) => run_normalize(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
