//! Book structure for quire.
//!
//! This crate provides:
//! - [`paths`]: helpers that normalize relative paths and reject traversal
//! - [`SummaryGraph`]: the navigation graph parsed from `SUMMARY.md`
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use quire_book::SummaryGraph;
//!
//! let outline = "- [Intro](README.md)\n- [Guide](guide.md)\n";
//! let graph = SummaryGraph::parse(outline, Path::new("book"), true)?;
//!
//! let routes: Vec<_> = graph.chapters().map(|c| c.chapter.route_path.as_str()).collect();
//! assert_eq!(routes, ["/", "/guide/"]);
//! # Ok(())
//! # }
//! ```

pub mod paths;
mod summary;

pub use summary::{
    Chapter, ChapterRef, EntryKind, LinkEntry, SUMMARY_FILENAME, SummaryEntry, SummaryError,
    SummaryGraph,
};
