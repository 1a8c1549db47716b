//! quire CLI - static documentation site generator.
//!
//! Provides commands for:
//! - `build`: Build the static site
//! - `serve`: Serve an existing build
//! - `dev`: Build, serve and rebuild on change
//! - `check`: Validate the book without building
//! - `init`: Scaffold a new project
//! - `new`: Add a chapter

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CheckArgs, DevArgs, InitArgs, NewArgs, ServeArgs};
use error::CliError;
use output::Output;

/// quire - static documentation site generator.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static site.
    Build(BuildArgs),
    /// Serve an existing build.
    Serve(ServeArgs),
    /// Build, serve and rebuild on change.
    Dev(DevArgs),
    /// Validate SUMMARY.md, chapter files and links.
    Check(CheckArgs),
    /// Create a new project.
    Init(InitArgs),
    /// Create a new chapter.
    New(NewArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let verbose = matches!(&cli.command, Commands::Dev(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Serve(args) => block_on(args.execute()),
        Commands::Dev(args) => block_on(args.execute()),
        Commands::Check(args) => args.execute(),
        Commands::Init(args) => args.execute(),
        Commands::New(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn block_on(future: impl Future<Output = Result<(), CliError>>) -> Result<(), CliError> {
    tokio::runtime::Runtime::new()?.block_on(future)
}
