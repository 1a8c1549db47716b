//! Book validation without writing output.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ignore::WalkBuilder;
use quire_book::paths::{self, join_relative};
use quire_book::{SUMMARY_FILENAME, SummaryGraph};
use quire_config::Config;
use regex::Regex;

use crate::error::BuildError;

static FENCED_BACKTICK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("invalid fence regex"));

static FENCED_TILDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)~~~.*?~~~").expect("invalid fence regex"));

static INLINE_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]*`").expect("invalid inline code regex"));

static MARKDOWN_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[[^\]]*\]\(([^)]+)\)").expect("invalid link regex"));

/// A problem found by [`check_site`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckIssue {
    /// A chapter listed in `SUMMARY.md` has no file.
    MissingChapter { source_path: String },
    DuplicateRoute {
        route_path: String,
        first: String,
        second: String,
    },
    DuplicateOutput {
        output_path: String,
        first: String,
        second: String,
    },
    /// A relative markdown link whose target file does not exist.
    BrokenLink { chapter: String, target: String },
    /// A markdown file under the source directory that no chapter references.
    Orphan { path: String },
}

impl fmt::Display for CheckIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChapter { source_path } => {
                write!(f, "{source_path}: chapter file referenced by {SUMMARY_FILENAME} does not exist")
            }
            Self::DuplicateRoute {
                route_path,
                first,
                second,
            } => write!(f, "duplicate route path `{route_path}` for `{first}` and `{second}`"),
            Self::DuplicateOutput {
                output_path,
                first,
                second,
            } => write!(f, "duplicate output path `{output_path}` for `{first}` and `{second}`"),
            Self::BrokenLink { chapter, target } => {
                write!(f, "{chapter}: links to missing markdown file `{target}`")
            }
            Self::Orphan { path } => write!(f, "{path}: not referenced by {SUMMARY_FILENAME}"),
        }
    }
}

/// Result of a validation pass.
#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    pub src_dir: PathBuf,
    /// Number of outline entries, nested ones included.
    pub entry_count: usize,
    pub chapter_count: usize,
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate the book structure and intra-doc links.
///
/// # Errors
///
/// Returns an error if `SUMMARY.md` can't be parsed or the source directory
/// can't be read. Content problems are reported as [`CheckIssue`]s.
pub fn check_site(config: &Config) -> Result<CheckReport, BuildError> {
    let book = &config.book_resolved;
    let graph = SummaryGraph::load(&book.src_dir, book.pretty_urls)?;

    let mut issues = Vec::new();

    for chapter in graph.chapters() {
        if !chapter.chapter.source_absolute_path.is_file() {
            issues.push(CheckIssue::MissingChapter {
                source_path: chapter.chapter.source_path.clone(),
            });
        }
    }

    let mut routes: HashMap<&str, &str> = HashMap::new();
    let mut outputs: HashMap<&str, &str> = HashMap::new();
    for chapter in graph.chapters() {
        let source = chapter.chapter.source_path.as_str();
        if let Some(first) = routes.get(chapter.chapter.route_path.as_str()) {
            issues.push(CheckIssue::DuplicateRoute {
                route_path: chapter.chapter.route_path.clone(),
                first: (*first).to_owned(),
                second: source.to_owned(),
            });
        } else {
            routes.insert(&chapter.chapter.route_path, source);
        }
        if let Some(first) = outputs.get(chapter.chapter.output_path.as_str()) {
            issues.push(CheckIssue::DuplicateOutput {
                output_path: chapter.chapter.output_path.clone(),
                first: (*first).to_owned(),
                second: source.to_owned(),
            });
        } else {
            outputs.insert(&chapter.chapter.output_path, source);
        }
    }

    for chapter in graph.chapters() {
        // Missing files were reported above.
        let Ok(markdown) = std::fs::read_to_string(&chapter.chapter.source_absolute_path) else {
            continue;
        };
        for target in linked_markdown_paths(&markdown, &chapter.chapter.source_path) {
            if !book.src_dir.join(&target).is_file() {
                issues.push(CheckIssue::BrokenLink {
                    chapter: chapter.chapter.source_path.clone(),
                    target,
                });
            }
        }
    }

    let known: HashSet<&str> = graph
        .chapters()
        .map(|c| c.chapter.source_path.as_str())
        .collect();
    for path in collect_markdown_files(&book.src_dir)? {
        if !path.eq_ignore_ascii_case(SUMMARY_FILENAME) && !known.contains(path.as_str()) {
            issues.push(CheckIssue::Orphan { path });
        }
    }

    tracing::debug!(issues = issues.len(), "Check finished");

    Ok(CheckReport {
        src_dir: book.src_dir.clone(),
        entry_count: count_entries(graph.entries()),
        chapter_count: graph.chapter_count(),
        issues,
    })
}

fn count_entries(entries: &[quire_book::SummaryEntry]) -> usize {
    entries
        .iter()
        .map(|entry| 1 + count_entries(&entry.children))
        .sum()
}

fn strip_code(markdown: &str) -> String {
    let text = FENCED_BACKTICK_PATTERN.replace_all(markdown, "\n");
    let text = FENCED_TILDE_PATTERN.replace_all(&text, "\n");
    INLINE_CODE_PATTERN.replace_all(&text, "").into_owned()
}

/// Source-root-relative targets of relative markdown links, unique, in order.
fn linked_markdown_paths(markdown: &str, source_path: &str) -> Vec<String> {
    let scanned = strip_code(markdown);
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for caps in MARKDOWN_LINK_PATTERN.captures_iter(&scanned) {
        let raw = caps[1].split_whitespace().next().unwrap_or_default();
        let href = raw.trim_start_matches('<').trim_end_matches('>');
        if href.is_empty() || paths::is_external_href(href) {
            continue;
        }
        let path = paths::split_href(href).path;
        if !paths::is_markdown_path(path) {
            continue;
        }
        let Some(target) = join_relative(source_path, path) else {
            continue;
        };
        if seen.insert(target.clone()) {
            targets.push(target);
        }
    }

    targets
}

/// Markdown files under `src_dir` as sorted `/`-separated relative paths.
fn collect_markdown_files(src_dir: &Path) -> Result<BTreeSet<String>, BuildError> {
    let mut files = BTreeSet::new();
    for entry in WalkBuilder::new(src_dir).standard_filters(false).build() {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: src_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(src_dir) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if paths::is_markdown_path(&relative) {
            files.insert(relative);
        }
    }
    Ok(files)
}
