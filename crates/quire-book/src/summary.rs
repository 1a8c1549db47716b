//! Navigation graph parsed from `SUMMARY.md`.
//!
//! The outline is a markdown bullet list. Each item is a section title, an
//! external/non-markdown link, or a `[Title](path.md)` chapter. Indentation
//! nests items under the closest preceding item with a smaller indent.
//!
//! The tree has a single owner ([`SummaryGraph`]); lookups by id or source path
//! go through address indexes (child-index paths) rebuilt on every parse.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::paths::{self, RelativePathError};

/// Outline filename at the top of the source directory.
pub const SUMMARY_FILENAME: &str = "SUMMARY.md";

static LIST_ITEM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.+)$").expect("invalid list item regex"));

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\((.+)\)\s*$").expect("invalid link regex"));

static README_SUFFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|/)README$").expect("invalid readme regex"));

/// Error raised while loading or parsing the outline.
///
/// Line numbers are 1-based and refer to `SUMMARY.md`.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("Could not find SUMMARY.md in source directory: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SUMMARY.md does not include any entries: {}", .0.display())]
    Empty(PathBuf),
    #[error("Invalid SUMMARY entry at line {line}: missing title")]
    MissingTitle { line: usize },
    #[error("Invalid SUMMARY entry at line {line}: missing href")]
    MissingHref { line: usize },
    #[error("Invalid SUMMARY nesting at line {line}: indentation starts before a parent entry")]
    InvalidNesting { line: usize },
    #[error("Invalid SUMMARY link at line {line}: empty file path")]
    EmptyPath { line: usize },
    #[error("Invalid SUMMARY link at line {line}: path cannot traverse outside source dir")]
    PathTraversal { line: usize },
    #[error(
        "Duplicate SUMMARY chapter path `{path}` at line {line}. First defined at line {first_line}"
    )]
    DuplicateChapter {
        path: String,
        line: usize,
        first_line: usize,
    },
    #[error("SUMMARY.md does not include any chapter entries: {}", .0.display())]
    NoChapters(PathBuf),
}

/// An item of the outline tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// `section-N`, `link-N` or `chapter-N`, where N is the source line.
    pub id: String,
    pub title: String,
    /// 0 for root entries, parent depth + 1 otherwise.
    pub depth: usize,
    /// 1-based line in `SUMMARY.md`.
    pub line: usize,
    pub parent_id: Option<String>,
    pub children: Vec<SummaryEntry>,
    pub kind: EntryKind,
}

impl SummaryEntry {
    /// Chapter data when this entry is a chapter.
    pub fn as_chapter(&self) -> Option<&Chapter> {
        match &self.kind {
            EntryKind::Chapter(chapter) => Some(chapter),
            _ => None,
        }
    }
}

/// Variant-specific part of a [`SummaryEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Non-navigable heading grouping its children.
    Section,
    /// External or non-markdown reference.
    Link(LinkEntry),
    /// Markdown file rendered into a page.
    Chapter(Chapter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Href exactly as written in the outline.
    pub href: String,
    pub external: bool,
}

/// Routing and ordering data of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Href exactly as written in the outline.
    pub href: String,
    /// Normalized path relative to the source directory.
    pub source_path: String,
    pub source_absolute_path: PathBuf,
    /// URL path of the rendered page, without base path.
    pub route_path: String,
    /// File path of the rendered page relative to the output directory.
    pub output_path: String,
    /// Position in document order, starting at 0.
    pub order: usize,
    pub previous_chapter_id: Option<String>,
    pub next_chapter_id: Option<String>,
}

/// Borrowed view of a chapter entry.
#[derive(Debug, Clone, Copy)]
pub struct ChapterRef<'a> {
    pub entry: &'a SummaryEntry,
    pub chapter: &'a Chapter,
}

impl<'a> ChapterRef<'a> {
    fn new(entry: &'a SummaryEntry) -> Option<Self> {
        entry.as_chapter().map(|chapter| Self { entry, chapter })
    }

    pub fn id(&self) -> &'a str {
        &self.entry.id
    }

    pub fn title(&self) -> &'a str {
        &self.entry.title
    }
}

/// Address of an entry: child indexes from the root list down.
type Address = Vec<usize>;

/// Parsed outline with document-order chapter list and lookup indexes.
#[derive(Debug, Clone)]
pub struct SummaryGraph {
    summary_path: PathBuf,
    entries: Vec<SummaryEntry>,
    chapter_addresses: Vec<Address>,
    entry_by_id: HashMap<String, Address>,
    chapter_by_source_path: HashMap<String, Address>,
}

/// A bullet line of the outline before it is placed in the tree.
struct OutlineItem {
    indent: usize,
    line: usize,
    title: String,
    href: Option<String>,
}

impl SummaryGraph {
    /// Read and parse `<source_root>/SUMMARY.md`.
    pub fn load(source_root: &Path, pretty_urls: bool) -> Result<Self, SummaryError> {
        let summary_path = source_root.join(SUMMARY_FILENAME);
        if !summary_path.is_file() {
            return Err(SummaryError::NotFound(source_root.to_path_buf()));
        }
        let text = std::fs::read_to_string(&summary_path).map_err(|source| SummaryError::Io {
            path: summary_path.clone(),
            source,
        })?;
        Self::parse(&text, source_root, pretty_urls)
    }

    /// Parse outline text whose chapters live under `source_root`.
    pub fn parse(text: &str, source_root: &Path, pretty_urls: bool) -> Result<Self, SummaryError> {
        let summary_path = source_root.join(SUMMARY_FILENAME);
        let items = scan_items(text)?;
        if items.is_empty() {
            return Err(SummaryError::Empty(summary_path));
        }

        let mut roots: Vec<SummaryEntry> = Vec::new();
        let mut stack: Vec<(usize, SummaryEntry)> = Vec::new();
        let mut first_lines: HashMap<String, usize> = HashMap::new();

        for item in items {
            while stack.last().is_some_and(|(indent, _)| *indent >= item.indent) {
                if let Some((_, done)) = stack.pop() {
                    attach(&mut stack, &mut roots, done);
                }
            }

            let parent = stack.last().map(|(_, entry)| entry);
            if parent.is_none() && item.indent > 0 {
                return Err(SummaryError::InvalidNesting { line: item.line });
            }
            let depth = parent.map_or(0, |p| p.depth + 1);
            let parent_id = parent.map(|p| p.id.clone());

            let (prefix, kind) = match item.href {
                None => ("section", EntryKind::Section),
                Some(href) if paths::is_external_href(&href) || !paths::is_markdown_href(&href) => {
                    let external = paths::is_external_href(&href);
                    ("link", EntryKind::Link(LinkEntry { href, external }))
                }
                Some(href) => {
                    let source_path = paths::normalize_relative(&href).map_err(|err| match err {
                        RelativePathError::Empty => SummaryError::EmptyPath { line: item.line },
                        RelativePathError::Traversal => {
                            SummaryError::PathTraversal { line: item.line }
                        }
                    })?;
                    if let Some(&first_line) = first_lines.get(&source_path) {
                        return Err(SummaryError::DuplicateChapter {
                            path: source_path,
                            line: item.line,
                            first_line,
                        });
                    }
                    first_lines.insert(source_path.clone(), item.line);
                    ("chapter", EntryKind::Chapter(new_chapter(href, source_path, source_root, pretty_urls)))
                }
            };

            let entry = SummaryEntry {
                id: format!("{prefix}-{}", item.line),
                title: item.title,
                depth,
                line: item.line,
                parent_id,
                children: Vec::new(),
                kind,
            };
            stack.push((item.indent, entry));
        }

        while let Some((_, done)) = stack.pop() {
            attach(&mut stack, &mut roots, done);
        }

        let graph = Self::from_entries(summary_path, roots);
        if graph.chapter_addresses.is_empty() {
            return Err(SummaryError::NoChapters(graph.summary_path));
        }

        tracing::debug!(
            entries = graph.entry_by_id.len(),
            chapters = graph.chapter_addresses.len(),
            "Parsed summary"
        );
        Ok(graph)
    }

    /// Index a finished tree and link chapters in document order.
    fn from_entries(summary_path: PathBuf, mut entries: Vec<SummaryEntry>) -> Self {
        let mut addresses = Vec::new();
        collect_addresses(&entries, &mut Vec::new(), &mut addresses);

        let mut chapter_addresses = Vec::new();
        let mut entry_by_id = HashMap::new();
        let mut chapter_by_source_path = HashMap::new();
        let mut chapter_ids = Vec::new();

        for address in addresses {
            let Some(entry) = lookup(&entries, &address) else {
                continue;
            };
            if let Some(chapter) = entry.as_chapter() {
                chapter_by_source_path.insert(chapter.source_path.clone(), address.clone());
                chapter_ids.push(entry.id.clone());
                chapter_addresses.push(address.clone());
            }
            entry_by_id.insert(entry.id.clone(), address);
        }

        for (order, address) in chapter_addresses.iter().enumerate() {
            if let Some(EntryKind::Chapter(chapter)) =
                lookup_mut(&mut entries, address).map(|entry| &mut entry.kind)
            {
                chapter.order = order;
                chapter.previous_chapter_id = order
                    .checked_sub(1)
                    .and_then(|index| chapter_ids.get(index))
                    .cloned();
                chapter.next_chapter_id = chapter_ids.get(order + 1).cloned();
            }
        }

        Self {
            summary_path,
            entries,
            chapter_addresses,
            entry_by_id,
            chapter_by_source_path,
        }
    }

    fn at(&self, address: &[usize]) -> Option<&SummaryEntry> {
        lookup(&self.entries, address)
    }

    /// Path of the outline file this graph was parsed for.
    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    /// Root entries in document order.
    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }

    /// Chapters in document (depth-first) order.
    pub fn chapters(&self) -> impl Iterator<Item = ChapterRef<'_>> + '_ {
        self.chapter_addresses
            .iter()
            .filter_map(|address| self.at(address).and_then(ChapterRef::new))
    }

    pub fn chapter_count(&self) -> usize {
        self.chapter_addresses.len()
    }

    /// Look up any entry by id.
    pub fn entry(&self, id: &str) -> Option<&SummaryEntry> {
        self.entry_by_id.get(id).and_then(|address| self.at(address))
    }

    /// Look up a chapter by id.
    pub fn chapter(&self, id: &str) -> Option<ChapterRef<'_>> {
        self.entry(id).and_then(ChapterRef::new)
    }

    /// Look up a chapter by its normalized source path.
    pub fn chapter_by_source_path(&self, source_path: &str) -> Option<ChapterRef<'_>> {
        self.chapter_by_source_path
            .get(source_path)
            .and_then(|address| self.at(address))
            .and_then(ChapterRef::new)
    }

    pub fn first_chapter_id(&self) -> Option<&str> {
        self.chapters().next().map(|c| c.id())
    }

    pub fn last_chapter_id(&self) -> Option<&str> {
        self.chapters().last().map(|c| c.id())
    }
}

/// Place a finished entry under the current stack top, or at the root.
fn attach(stack: &mut [(usize, SummaryEntry)], roots: &mut Vec<SummaryEntry>, entry: SummaryEntry) {
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(entry),
        None => roots.push(entry),
    }
}

fn lookup<'a>(entries: &'a [SummaryEntry], address: &[usize]) -> Option<&'a SummaryEntry> {
    let (first, rest) = address.split_first()?;
    let mut entry = entries.get(*first)?;
    for index in rest {
        entry = entry.children.get(*index)?;
    }
    Some(entry)
}

fn lookup_mut<'a>(
    entries: &'a mut [SummaryEntry],
    address: &[usize],
) -> Option<&'a mut SummaryEntry> {
    let (first, rest) = address.split_first()?;
    let mut entry = entries.get_mut(*first)?;
    for index in rest {
        entry = entry.children.get_mut(*index)?;
    }
    Some(entry)
}

fn collect_addresses(entries: &[SummaryEntry], prefix: &mut Address, out: &mut Vec<Address>) {
    for (index, entry) in entries.iter().enumerate() {
        prefix.push(index);
        out.push(prefix.clone());
        collect_addresses(&entry.children, prefix, out);
        prefix.pop();
    }
}

fn scan_items(text: &str) -> Result<Vec<OutlineItem>, SummaryError> {
    let mut items = Vec::new();

    for (index, raw_line) in text.split('\n').enumerate() {
        let line_text = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let Some(captures) = LIST_ITEM_PATTERN.captures(line_text) else {
            continue;
        };
        let line = index + 1;
        let indent = captures[1].replace('\t', "  ").len();
        let raw = captures[2].trim();
        if raw.is_empty() {
            continue;
        }

        let item = if let Some(link) = LINK_PATTERN.captures(raw) {
            let title = link[1].trim();
            let href = link[2].trim();
            if title.is_empty() {
                return Err(SummaryError::MissingTitle { line });
            }
            if href.is_empty() {
                return Err(SummaryError::MissingHref { line });
            }
            OutlineItem {
                indent,
                line,
                title: title.to_owned(),
                href: Some(href.to_owned()),
            }
        } else {
            OutlineItem {
                indent,
                line,
                title: raw.to_owned(),
                href: None,
            }
        };
        items.push(item);
    }

    Ok(items)
}

fn new_chapter(href: String, source_path: String, source_root: &Path, pretty_urls: bool) -> Chapter {
    let stem = route_stem(&source_path);
    let (route_path, output_path) = match (pretty_urls, stem.is_empty()) {
        (true, true) => ("/".to_owned(), "index.html".to_owned()),
        (true, false) => (format!("/{stem}/"), format!("{stem}/index.html")),
        (false, true) => ("/index.html".to_owned(), "index.html".to_owned()),
        (false, false) => (format!("/{stem}.html"), format!("{stem}.html")),
    };

    Chapter {
        href,
        source_absolute_path: source_root.join(&source_path),
        source_path,
        route_path,
        output_path,
        order: 0,
        previous_chapter_id: None,
        next_chapter_id: None,
    }
}

/// Source path without markdown extension and trailing `README` segment.
fn route_stem(source_path: &str) -> String {
    let without_ext = paths::strip_markdown_extension(source_path);
    let without_readme = README_SUFFIX_PATTERN.replace(without_ext, "");
    let cleaned = without_readme.strip_prefix('/').unwrap_or(&without_readme);
    cleaned.strip_suffix('/').unwrap_or(cleaned).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> SummaryGraph {
        SummaryGraph::parse(text, Path::new("/book"), true).unwrap()
    }

    fn parse_err(text: &str) -> SummaryError {
        SummaryGraph::parse(text, Path::new("/book"), true).unwrap_err()
    }

    #[test]
    fn test_chapters_in_document_order() {
        let graph = parse(
            "# Summary\n\n- [Intro](README.md)\n- Guide\n  - [Setup](guide/setup.md)\n    - [Advanced](guide/advanced.md)\n  - [Usage](guide/usage.md)\n- [FAQ](faq.md)\n",
        );

        let titles: Vec<_> = graph.chapters().map(|c| c.title()).collect();
        assert_eq!(titles, ["Intro", "Setup", "Advanced", "Usage", "FAQ"]);

        let orders: Vec<_> = graph.chapters().map(|c| c.chapter.order).collect();
        assert_eq!(orders, [0, 1, 2, 3, 4]);
        assert_eq!(graph.chapter_count(), 5);
    }

    #[test]
    fn test_previous_next_links() {
        let graph = parse("- [A](a.md)\n  - [B](b.md)\n- [C](c.md)\n");
        let chapters: Vec<_> = graph.chapters().collect();

        assert_eq!(chapters[0].chapter.previous_chapter_id, None);
        assert_eq!(chapters[0].chapter.next_chapter_id.as_deref(), Some("chapter-2"));
        assert_eq!(chapters[1].chapter.previous_chapter_id.as_deref(), Some("chapter-1"));
        assert_eq!(chapters[1].chapter.next_chapter_id.as_deref(), Some("chapter-3"));
        assert_eq!(chapters[2].chapter.previous_chapter_id.as_deref(), Some("chapter-2"));
        assert_eq!(chapters[2].chapter.next_chapter_id, None);

        assert_eq!(graph.first_chapter_id(), Some("chapter-1"));
        assert_eq!(graph.last_chapter_id(), Some("chapter-3"));
    }

    #[test]
    fn test_entry_kinds_and_ids() {
        let graph = parse(
            "- Getting Started\n  - [Intro](README.md)\n  - [Repo](https://github.com/example/repo)\n  - [Logo](logo.png)\n",
        );

        let section = graph.entry("section-1").unwrap();
        assert_eq!(section.kind, EntryKind::Section);
        assert_eq!(section.depth, 0);
        assert_eq!(section.children.len(), 3);

        let chapter = graph.entry("chapter-2").unwrap();
        assert_eq!(chapter.depth, 1);
        assert_eq!(chapter.parent_id.as_deref(), Some("section-1"));

        let external = graph.entry("link-3").unwrap();
        assert_eq!(
            external.kind,
            EntryKind::Link(LinkEntry {
                href: "https://github.com/example/repo".to_owned(),
                external: true,
            })
        );

        let asset = graph.entry("link-4").unwrap();
        assert_eq!(
            asset.kind,
            EntryKind::Link(LinkEntry {
                href: "logo.png".to_owned(),
                external: false,
            })
        );
    }

    #[test]
    fn test_pretty_routes() {
        let graph = parse("- [Intro](README.md)\n- [Guide](guide.md)\n- [Nested](api/README.md)\n");
        let routes: Vec<_> = graph
            .chapters()
            .map(|c| (c.chapter.route_path.as_str(), c.chapter.output_path.as_str()))
            .collect();

        assert_eq!(
            routes,
            [
                ("/", "index.html"),
                ("/guide/", "guide/index.html"),
                ("/api/", "api/index.html"),
            ]
        );
    }

    #[test]
    fn test_flat_routes() {
        let graph = SummaryGraph::parse(
            "- [Intro](readme.md)\n- [Guide](guide.md)\n",
            Path::new("/book"),
            false,
        )
        .unwrap();
        let routes: Vec<_> = graph
            .chapters()
            .map(|c| (c.chapter.route_path.as_str(), c.chapter.output_path.as_str()))
            .collect();

        assert_eq!(
            routes,
            [("/index.html", "index.html"), ("/guide.html", "guide.html")]
        );
    }

    #[test]
    fn test_source_paths_normalized() {
        let graph = parse("- [Setup](./guide/../setup.md#install)\n");
        let chapter = graph.chapter_by_source_path("setup.md").unwrap();

        assert_eq!(chapter.chapter.href, "./guide/../setup.md#install");
        assert_eq!(
            chapter.chapter.source_absolute_path,
            PathBuf::from("/book/setup.md")
        );
    }

    #[test]
    fn test_tabs_count_as_two_spaces() {
        let graph = parse("- Section\n\t- [A](a.md)\n  - [B](b.md)\n");
        let section = graph.entry("section-1").unwrap();
        assert_eq!(section.children.len(), 2);
    }

    #[test]
    fn test_crlf_lines() {
        let graph = parse("- [A](a.md)\r\n- [B](b.md)\r\n");
        assert_eq!(graph.chapter_count(), 2);
        assert_eq!(graph.entry("chapter-2").unwrap().title, "B");
    }

    #[test]
    fn test_duplicate_chapter_rejected() {
        let err = parse_err("- [A](guide.md)\n- [B](./guide.md)\n");
        assert!(matches!(
            err,
            SummaryError::DuplicateChapter {
                line: 2,
                first_line: 1,
                ..
            }
        ));
        assert!(err.to_string().contains("First defined at line 1"));
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(matches!(
            parse_err("- [Secret](../secret.md)\n"),
            SummaryError::PathTraversal { line: 1 }
        ));
        assert!(matches!(
            parse_err("- [A](a.md)\n- [Up](a/../../up.md)\n"),
            SummaryError::PathTraversal { line: 2 }
        ));
    }

    #[test]
    fn test_invalid_nesting_rejected() {
        assert!(matches!(
            parse_err("  - [A](a.md)\n"),
            SummaryError::InvalidNesting { line: 1 }
        ));
    }

    #[test]
    fn test_missing_title_and_href() {
        assert!(matches!(
            parse_err("- [ ](a.md)\n"),
            SummaryError::MissingTitle { line: 1 }
        ));
        assert!(matches!(
            parse_err("- [A]( )\n"),
            SummaryError::MissingHref { line: 1 }
        ));
    }

    #[test]
    fn test_empty_and_chapterless_outlines() {
        assert!(matches!(parse_err("# Summary\n\ntext\n"), SummaryError::Empty(_)));
        assert!(matches!(
            parse_err("- Section\n- [Site](https://example.com)\n"),
            SummaryError::NoChapters(_)
        ));
    }

    #[test]
    fn test_load_missing_summary() {
        let dir = tempfile::tempdir().unwrap();
        let err = SummaryGraph::load(dir.path(), true).unwrap_err();
        assert!(matches!(err, SummaryError::NotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SUMMARY.md"), "- [Intro](README.md)\n").unwrap();

        let graph = SummaryGraph::load(dir.path(), true).unwrap();

        assert_eq!(graph.summary_path(), dir.path().join("SUMMARY.md"));
        assert_eq!(graph.entries().len(), 1);
    }
}
