//! Static site build pipeline for quire.
//!
//! [`ArtifactPipeline`] turns a parsed [`SummaryGraph`](quire_book::SummaryGraph)
//! into a deployable output directory:
//!
//! 1. **clean** - remove and recreate the output directory
//! 2. **assets** - copy the public directory, bundle client assets
//! 3. **pages** - render every chapter, rewrite links, write page + markdown mirror
//! 4. **search-seo** - write `search-index.json`, `sitemap.xml`, `robots.txt`, `llms.txt`
//!
//! Progress is reported through a [`ProgressSink`]; the returned
//! [`BuildResult`] lists every file that was written.

mod bundler;
mod check;
mod edit;
mod error;
mod links;
mod pipeline;
mod progress;
mod search;
mod seo;
mod template;

pub use bundler::{BundleOptions, BundleOutput, Bundler, CLIENT_ENTRY, EmbeddedBundler};
pub use check::{CheckIssue, CheckReport, check_site};
pub use error::BuildError;
pub use links::rewrite_chapter_links;
pub use pipeline::{ArtifactPipeline, BuildOptions, BuildResult, BuildTimings, build_site, render_options};
pub use progress::{Phase, ProgressEvent, ProgressSink, Status};
pub use search::{SEARCH_INDEX_FILENAME, SearchEntry};
