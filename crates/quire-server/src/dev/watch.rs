//! Filesystem watchers for the dev loop.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quire_config::Config;
use tokio::sync::mpsc;

/// Paths to watch for a configuration: source and public directories
/// recursively, the config file itself non-recursively.
pub(super) fn watch_roots(config: &Config) -> Vec<(PathBuf, RecursiveMode)> {
    let book = &config.book_resolved;
    let mut roots = vec![
        (book.src_dir.clone(), RecursiveMode::Recursive),
        (book.public_dir.clone(), RecursiveMode::Recursive),
    ];
    if let Some(config_path) = &config.config_path {
        roots.push((config_path.clone(), RecursiveMode::NonRecursive));
    }
    roots
}

/// Create one watcher per existing root.
///
/// Changed paths are sent to `sender`; events under the output directory are
/// dropped. Roots that don't exist or can't be watched are skipped.
pub(super) fn arm_watchers(
    config: &Config,
    sender: &mpsc::UnboundedSender<PathBuf>,
) -> Vec<RecommendedWatcher> {
    let ignored = IgnoredDir::new(&config.book_resolved.out_dir);
    let mut watchers = Vec::new();

    for (root, mode) in watch_roots(config) {
        if !root.exists() {
            tracing::debug!(path = %root.display(), "Skipping missing watch root");
            continue;
        }

        let sender = sender.clone();
        let ignored = ignored.clone();
        let watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) if is_change(&event.kind) => {
                    for path in event.paths {
                        if !ignored.contains(&path) {
                            let _ = sender.send(path);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Watch error"),
            }
        });

        let armed = watcher.and_then(|mut watcher| {
            watcher.watch(&root, mode)?;
            Ok(watcher)
        });
        match armed {
            Ok(watcher) => watchers.push(watcher),
            Err(e) => tracing::warn!(path = %root.display(), error = %e, "Failed to watch path"),
        }
    }

    tracing::debug!(count = watchers.len(), "Watchers armed");
    watchers
}

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Output directory, matched both as configured and canonicalized.
#[derive(Clone, Debug)]
struct IgnoredDir {
    configured: PathBuf,
    canonical: Option<PathBuf>,
}

impl IgnoredDir {
    fn new(dir: &Path) -> Self {
        Self {
            configured: dir.to_path_buf(),
            canonical: dir.canonicalize().ok(),
        }
    }

    fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.configured)
            || self
                .canonical
                .as_ref()
                .is_some_and(|canonical| path.starts_with(canonical))
    }
}
