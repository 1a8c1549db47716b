//! Application state.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use quire_config::Config;

/// What the server currently serves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServeTarget {
    pub out_dir: PathBuf,
    /// Normalized base path (`/` or `/docs`).
    pub base_path: String,
    pub pretty_urls: bool,
}

impl ServeTarget {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            out_dir: config.book_resolved.out_dir.clone(),
            base_path: config.book_resolved.base_path.clone(),
            pretty_urls: config.book_resolved.pretty_urls,
        }
    }
}

/// Shared, replaceable [`ServeTarget`].
///
/// The dev loop swaps the target after each successful rebuild while
/// request handlers keep reading it.
#[derive(Clone, Debug)]
pub struct TargetHandle(Arc<RwLock<ServeTarget>>);

impl TargetHandle {
    #[must_use]
    pub fn new(target: ServeTarget) -> Self {
        Self(Arc::new(RwLock::new(target)))
    }

    /// Snapshot of the current target.
    #[must_use]
    pub fn get(&self) -> ServeTarget {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn replace(&self, target: ServeTarget) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = target;
    }
}

/// Application state shared across all handlers.
pub(crate) struct AppState {
    pub(crate) target: TargetHandle,
    /// Dev mode: every response carries `Cache-Control: no-store`.
    pub(crate) dev: bool,
}
