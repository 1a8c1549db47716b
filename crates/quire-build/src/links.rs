//! Intra-doc link rewriting.
//!
//! Rendered chapters link to each other by markdown path (`guide.md#setup`).
//! Those hrefs are replaced with the route of the target chapter.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use quire_book::SummaryGraph;
use quire_book::paths::{self, to_base_path_href};
use quire_renderer::escape_html;
use regex::{Captures, Regex};

static ANCHOR_HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b([^>]*?)\bhref=("([^"]*)"|'([^']*)')([^>]*)>"#)
        .expect("invalid anchor regex")
});

/// Rewrite `<a href>` values pointing at chapter markdown files to chapter routes.
///
/// `current_source_path` is the source path of the page being rendered;
/// relative hrefs are resolved against its directory. Hrefs that are external,
/// not markdown, escape the source root, or don't match a chapter are kept
/// byte-for-byte.
pub fn rewrite_chapter_links(
    html: &str,
    current_source_path: &str,
    graph: &SummaryGraph,
    base_path: &str,
) -> String {
    ANCHOR_HREF_PATTERN
        .replace_all(html, |caps: &Captures<'_>| {
            let full = &caps[0];
            let href = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());

            match resolve_chapter_href(href, current_source_path, graph, base_path) {
                Some((route, suffix)) => format!(
                    r#"<a{}href="{}{}"{}>"#,
                    &caps[1],
                    escape_html(&route),
                    suffix.replace('"', "&quot;"),
                    &caps[5]
                ),
                None => full.to_owned(),
            }
        })
        .into_owned()
}

/// Route of the linked chapter plus the query and fragment as written.
///
/// The suffix is still attribute-escaped and must not be escaped again.
fn resolve_chapter_href<'h>(
    href: &'h str,
    current_source_path: &str,
    graph: &SummaryGraph,
    base_path: &str,
) -> Option<(String, &'h str)> {
    let href = href.trim();
    if href.is_empty() || paths::is_external_href(href) {
        return None;
    }

    let parts = paths::split_href(href);
    if !paths::is_markdown_path(parts.path) {
        return None;
    }

    let decoded = percent_decode_str(parts.path).decode_utf8().ok()?;
    let source_path = paths::join_relative(current_source_path, &decoded)?;
    let chapter = graph.chapter_by_source_path(&source_path)?;

    let suffix = &href[parts.path.len()..];
    Some((to_base_path_href(base_path, &chapter.chapter.route_path), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn graph() -> SummaryGraph {
        SummaryGraph::parse(
            "- [Intro](README.md)\n- [Guide](guide/setup.md)\n- [My Notes](notes/my notes.md)\n",
            Path::new("/book"),
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_rewrites_relative_link() {
        let html = r#"<p><a href="../README.md">Home</a></p>"#;
        assert_eq!(
            rewrite_chapter_links(html, "guide/setup.md", &graph(), "/"),
            r#"<p><a href="/">Home</a></p>"#
        );
    }

    #[test]
    fn test_keeps_query_and_fragment_with_base_path() {
        let html = r#"<a class="x" href='setup.md?v=1&amp;w=2#install' title="t">Setup</a>"#;
        assert_eq!(
            rewrite_chapter_links(html, "guide/other.md", &graph(), "/docs"),
            r#"<a class="x" href="/docs/guide/setup/?v=1&amp;w=2#install" title="t">Setup</a>"#
        );
    }

    #[test]
    fn test_ampersand_in_fragment_is_not_escaped_twice() {
        let html = concat!(
            r#"<a href="guide/setup.md#a&amp;b">x</a>"#,
            r#"<a href="guide/setup.md?p=1&amp;q=2#s&amp;t">y</a>"#,
        );
        let out = rewrite_chapter_links(html, "README.md", &graph(), "/");
        assert_eq!(
            out,
            concat!(
                r#"<a href="/guide/setup/#a&amp;b">x</a>"#,
                r#"<a href="/guide/setup/?p=1&amp;q=2#s&amp;t">y</a>"#,
            )
        );
        assert!(!out.contains("&amp;amp;"));
    }

    #[test]
    fn test_root_relative_link() {
        let html = r#"<A HREF="/guide/setup.md">Setup</A>"#;
        assert_eq!(
            rewrite_chapter_links(html, "README.md", &graph(), "/"),
            r#"<a href="/guide/setup/">Setup</A>"#
        );
    }

    #[test]
    fn test_percent_encoded_path_is_decoded() {
        let html = r#"<a href="notes/my%20notes.md">Notes</a>"#;
        assert_eq!(
            rewrite_chapter_links(html, "README.md", &graph(), "/"),
            r#"<a href="/notes/my notes/">Notes</a>"#
        );
    }

    #[test]
    fn test_leaves_other_links_untouched() {
        let html = concat!(
            r#"<a href="https://example.com/a.md">x</a>"#,
            r##"<a href="#top">x</a>"##,
            r#"<a href="image.png">x</a>"#,
            r#"<a href="missing.md">x</a>"#,
            r#"<a href="../../escape.md">x</a>"#,
            r#"<a href="">x</a>"#,
        );
        assert_eq!(rewrite_chapter_links(html, "guide/setup.md", &graph(), "/"), html);
    }
}
