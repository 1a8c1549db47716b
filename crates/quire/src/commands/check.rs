//! `quire check` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_build::check_site;
use quire_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    src_dir: Option<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or `SUMMARY.md` can't be loaded, or
    /// [`CliError::CheckFailed`] if any issue was found.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            src_dir: self.src_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        config.validate()?;

        let report = check_site(&config)?;
        output.info(&format!(
            "Checked {} ({} entries, {} chapters)",
            report.src_dir.display(),
            report.entry_count,
            report.chapter_count
        ));

        if report.is_ok() {
            output.success("No issues found");
            return Ok(());
        }

        for issue in &report.issues {
            output.warning(&format!("  {issue}"));
        }
        Err(CliError::CheckFailed(report.issues.len()))
    }
}
