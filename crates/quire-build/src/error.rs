//! Build error type.

use std::path::PathBuf;

use quire_book::SummaryError;

/// Error returned by the build pipeline.
///
/// Files written before the error stay in the output directory.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Summary(#[from] SummaryError),
    #[error("Chapter file does not exist for SUMMARY entry: {source_path}")]
    ChapterMissing { source_path: String },
    #[error("Failed to bundle client assets: {0}")]
    Bundle(String),
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
    #[error("Failed to serialize search index: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    /// Wrap an I/O error with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
