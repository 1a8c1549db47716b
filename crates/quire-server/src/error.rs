//! Server error type.

use std::path::PathBuf;

/// Error returned when the server can't start or stops abnormally.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {address}: {source}")]
    Addr {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "No build output found in {}. Run `quire build` first or pass `--build`.",
        .0.display()
    )]
    MissingOutput(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
