//! Development loop: watch, debounce, rebuild, serve.
//!
//! Filesystem events restart a debounce timer; when the timer runs out a
//! rebuild is requested. Rebuilds never overlap: a request arriving while one
//! runs is parked in a single pending slot and picked up as soon as the
//! running rebuild finishes. Only a successful rebuild swaps the served
//! output and re-arms the watchers.

mod dev_loop;
mod rebuild;
mod watch;

pub use dev_loop::DevLoop;
pub use rebuild::{Rebuild, RebuildError, SiteRebuilder};
