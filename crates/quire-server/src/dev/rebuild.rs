//! The rebuild step run by the dev loop.

use std::path::PathBuf;

use quire_build::{BuildError, BuildOptions, build_site};
use quire_config::{CliSettings, Config, ConfigError};

/// Error from a single rebuild. Logged, never fatal to the dev loop.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("Rebuild task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One rebuild of the site.
///
/// Runs on the blocking thread pool. Returns the configuration the build
/// used so the caller can re-arm watchers and swap the served output.
pub trait Rebuild: Send + Sync + 'static {
    fn rebuild(&self, reason: &str) -> Result<Config, RebuildError>;
}

/// Production rebuild: re-read `quire.toml` from disk and run the pipeline.
#[derive(Clone, Debug, Default)]
pub struct SiteRebuilder {
    config_path: Option<PathBuf>,
    cli_settings: CliSettings,
    options: BuildOptions,
}

impl SiteRebuilder {
    /// `config_path` and `cli_settings` are applied on every reload, the same
    /// way the initial load applied them.
    #[must_use]
    pub fn new(config_path: Option<PathBuf>, cli_settings: CliSettings) -> Self {
        Self {
            config_path,
            cli_settings,
            options: BuildOptions::default(),
        }
    }

    /// Load configuration the way every rebuild does.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let config = Config::load(self.config_path.as_deref(), Some(&self.cli_settings))?;
        config.validate()?;
        Ok(config)
    }
}

impl Rebuild for SiteRebuilder {
    fn rebuild(&self, reason: &str) -> Result<Config, RebuildError> {
        tracing::info!(reason, "Rebuilding");
        let config = self.load_config()?;
        let result = build_site(&config, &self.options, None)?;
        tracing::info!(
            pages = result.page_count,
            elapsed_ms = result.timings.total.as_millis(),
            "Rebuild complete"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_site_rebuilder_rereads_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("quire.toml");
        fs::create_dir_all(dir.path().join("book")).unwrap();
        fs::write(dir.path().join("book/SUMMARY.md"), "- [Intro](README.md)\n").unwrap();
        fs::write(dir.path().join("book/README.md"), "# Intro\n").unwrap();
        fs::write(&config_path, "[site]\ntitle = \"First\"\n").unwrap();

        let rebuilder = SiteRebuilder::new(Some(config_path.clone()), CliSettings::default());
        let config = rebuilder.rebuild("initial").unwrap();
        assert_eq!(config.site.title, "First");
        assert!(config.book_resolved.out_dir.join("index.html").is_file());

        fs::write(&config_path, "[site]\ntitle = \"Second\"\n").unwrap();
        let config = rebuilder.rebuild("config changed").unwrap();
        assert_eq!(config.site.title, "Second");
    }

    #[test]
    fn test_site_rebuilder_reports_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("quire.toml");
        fs::write(&config_path, "[site]\ntitle = \"\"\n").unwrap();

        let rebuilder = SiteRebuilder::new(Some(config_path), CliSettings::default());
        let err = rebuilder.rebuild("edit").unwrap_err();

        assert!(matches!(err, RebuildError::Config(_)));
    }

    #[test]
    fn test_site_rebuilder_reports_build_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("quire.toml");
        fs::write(&config_path, "").unwrap();

        let rebuilder = SiteRebuilder::new(Some(config_path), CliSettings::default());
        let err = rebuilder.rebuild("edit").unwrap_err();

        assert!(matches!(err, RebuildError::Build(BuildError::Summary(_))));
    }
}
