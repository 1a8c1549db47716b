//! CLI error types.

use quire_build::BuildError;
use quire_config::ConfigError;
use quire_server::ServerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("Check failed with {0} issue(s)")]
    CheckFailed(usize),

    #[error("{0}")]
    Validation(String),
}
