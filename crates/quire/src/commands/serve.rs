//! `quire serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_build::BuildOptions;
use quire_config::{CliSettings, Config};
use quire_server::run_server;

use super::build::{build_with_progress, print_build_summary};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory to serve (overrides config).
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Build the site before serving.
    #[arg(long)]
    build: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the optional build fails, or
    /// the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            out_dir: self.out_dir,
            host: self.host,
            port: self.port,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        config.validate()?;

        if self.build {
            let result = build_with_progress(&config, &BuildOptions::default(), &output)?;
            print_build_summary(&output, &result);
        }

        output.highlight(&format!(
            "Serving {} at {}",
            config.book_resolved.out_dir.display(),
            site_address(&config)
        ));
        output.info("Press Ctrl+C to stop");

        run_server(&config).await?;
        Ok(())
    }
}

/// Browser URL of the served site.
pub(crate) fn site_address(config: &Config) -> String {
    let base_path = &config.book_resolved.base_path;
    let suffix = if base_path == "/" {
        "/".to_owned()
    } else {
        format!("{base_path}/")
    };
    format!("http://{}:{}{suffix}", config.server.host, config.server.port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_site_address() {
        let mut config = Config::default_with_base(Path::new("/site"));
        config.server.host = "127.0.0.1".to_owned();
        config.server.port = 4000;
        assert_eq!(site_address(&config), "http://127.0.0.1:4000/");

        config.book_resolved.base_path = "/docs".to_owned();
        assert_eq!(site_address(&config), "http://127.0.0.1:4000/docs/");
    }
}
