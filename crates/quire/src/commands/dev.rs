//! `quire dev` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use quire_build::BuildOptions;
use quire_config::CliSettings;
use quire_server::{SiteRebuilder, run_dev};

use super::build::{build_with_progress, print_build_summary};
use super::serve::site_address;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the dev command.
#[derive(Args)]
pub(crate) struct DevArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (log rebuilds and file changes).
    #[arg(short, long)]
    pub verbose: bool,
}

impl DevArgs {
    /// Execute the dev command.
    ///
    /// The initial build must succeed; later rebuild failures are logged and
    /// the previous output stays served.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the initial build fails, or
    /// the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            ..CliSettings::default()
        };
        let rebuilder = SiteRebuilder::new(self.config, cli_settings);
        let config = rebuilder.load_config()?;

        let result = build_with_progress(&config, &BuildOptions::default(), &output)?;
        print_build_summary(&output, &result);

        output.highlight(&format!("Dev server at {}", site_address(&config)));
        output.info(&format!(
            "Watching {} for changes",
            config.book_resolved.src_dir.display()
        ));
        output.info("Press Ctrl+C to stop");

        run_dev(config, Arc::new(rebuilder)).await?;
        Ok(())
    }
}
