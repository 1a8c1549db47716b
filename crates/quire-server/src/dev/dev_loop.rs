//! Dev loop state machine.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use notify::RecommendedWatcher;
use quire_config::Config;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::rebuild::{Rebuild, RebuildError};
use super::watch::arm_watchers;
use crate::state::{ServeTarget, TargetHandle};

/// Watches the book, debounces changes and runs serialized rebuilds.
///
/// Cloning is cheap; clones share the same state. Must be used from within
/// a tokio runtime.
#[derive(Clone)]
pub struct DevLoop {
    inner: Arc<Inner>,
}

struct Inner {
    rebuilder: Arc<dyn Rebuild>,
    target: TargetHandle,
    events: mpsc::UnboundedSender<PathBuf>,
    state: Mutex<DevState>,
}

struct DevState {
    config: Config,
    watchers: Vec<RecommendedWatcher>,
    building: bool,
    pending: Option<String>,
    timer: Option<JoinHandle<()>>,
    /// Incremented whenever the timer is restarted; a firing timer whose
    /// generation is stale does nothing.
    timer_generation: u64,
    events_rx: Option<mpsc::UnboundedReceiver<PathBuf>>,
    forwarder: Option<JoinHandle<()>>,
    shutting_down: bool,
}

impl DevLoop {
    /// Create a dev loop for an already built `config`.
    ///
    /// `target` is swapped after every successful rebuild.
    #[must_use]
    pub fn new(config: Config, rebuilder: Arc<dyn Rebuild>, target: TargetHandle) -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                rebuilder,
                target,
                events,
                state: Mutex::new(DevState {
                    config,
                    watchers: Vec::new(),
                    building: false,
                    pending: None,
                    timer: None,
                    timer_generation: 0,
                    events_rx: Some(events_rx),
                    forwarder: None,
                    shutting_down: false,
                }),
            }),
        }
    }

    /// Arm watchers for the current configuration and start forwarding
    /// filesystem events into the debouncer.
    pub fn start(&self) {
        let mut state = self.inner.lock();
        if state.shutting_down {
            return;
        }
        state.watchers = arm_watchers(&state.config, &self.inner.events);

        if let Some(mut rx) = state.events_rx.take() {
            let dev = self.clone();
            state.forwarder = Some(tokio::spawn(async move {
                while let Some(path) = rx.recv().await {
                    tracing::debug!(path = %path.display(), "File changed");
                    dev.notify_change(format!("changed {}", path.display()));
                }
            }));
        }
        tracing::info!(watchers = state.watchers.len(), "Watching for changes");
    }

    /// Record a raw change and (re)start the debounce timer.
    ///
    /// The delay comes from the configuration of the latest successful
    /// rebuild. Only a timer that runs out without another change in between requests
    /// a rebuild, carrying the latest `reason`.
    pub fn notify_change(&self, reason: String) {
        let mut state = self.inner.lock();
        if state.shutting_down {
            return;
        }
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.timer_generation += 1;
        let generation = state.timer_generation;

        let dev = self.clone();
        let debounce = Duration::from_millis(state.config.dev.debounce_ms);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            {
                let mut state = dev.inner.lock();
                if state.timer_generation != generation {
                    return;
                }
                state.timer = None;
            }
            dev.request_rebuild(reason);
        }));
    }

    /// Start a rebuild now, or park `reason` if one is running.
    ///
    /// A parked reason replaces any earlier one.
    pub fn request_rebuild(&self, reason: String) {
        {
            let mut state = self.inner.lock();
            if state.shutting_down {
                return;
            }
            if state.building {
                tracing::debug!(reason, "Rebuild queued");
                state.pending = Some(reason);
                return;
            }
            state.building = true;
        }

        let dev = self.clone();
        tokio::spawn(async move { dev.run_rebuilds(reason).await });
    }

    /// Whether a rebuild is currently running.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.inner.lock().building
    }

    /// Cancel the debounce timer, drop watchers and ignore further events.
    ///
    /// Safe to call more than once. A rebuild already running completes but
    /// is not followed by the pending one.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock();
        if state.shutting_down {
            return;
        }
        state.shutting_down = true;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if let Some(forwarder) = state.forwarder.take() {
            forwarder.abort();
        }
        state.watchers.clear();
        state.pending = None;
        tracing::debug!("Dev loop stopped");
    }

    /// Run `reason`'s rebuild, then any rebuild parked meanwhile.
    async fn run_rebuilds(&self, mut reason: String) {
        loop {
            let rebuilder = Arc::clone(&self.inner.rebuilder);
            let current = reason.clone();
            let result = tokio::task::spawn_blocking(move || rebuilder.rebuild(&current))
                .await
                .map_err(RebuildError::from)
                .and_then(|result| result);

            match result {
                Ok(config) => self.apply(config),
                Err(e) => tracing::error!(reason, error = %e, "Rebuild failed; keeping previous output"),
            }

            let next = {
                let mut state = self.inner.lock();
                let next = state.pending.take();
                if next.is_none() || state.shutting_down {
                    state.building = false;
                    None
                } else {
                    next
                }
            };
            match next {
                Some(next) => reason = next,
                None => return,
            }
        }
    }

    /// Swap in the output and watchers of a successful rebuild.
    fn apply(&self, config: Config) {
        let watchers = arm_watchers(&config, &self.inner.events);
        let mut state = self.inner.lock();
        if state.shutting_down {
            return;
        }
        self.inner.target.replace(ServeTarget::from_config(&config));
        state.watchers = watchers;
        state.config = config;
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, DevState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
