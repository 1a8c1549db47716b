//! `sitemap.xml`, `robots.txt` and `llms.txt`.

use std::fmt::Write;
use std::path::Path;

use quire_book::SummaryGraph;
use quire_book::paths::{encode_path_for_href, to_base_path_href};
use quire_config::SiteConfig;
use quire_renderer::escape_html;

use crate::error::BuildError;
use crate::search::SEARCH_INDEX_FILENAME;

/// Site-level data needed to emit SEO files.
pub(crate) struct SeoContext<'a> {
    pub site: &'a SiteConfig,
    pub base_path: &'a str,
}

impl SeoContext<'_> {
    /// Base-path-prefixed href for a site path.
    pub(crate) fn href(&self, path: &str) -> String {
        to_base_path_href(self.base_path, path)
    }

    /// Absolute URL for an href, when the site URL is known.
    pub(crate) fn absolute(&self, href: &str) -> Option<String> {
        site_origin(&self.site.url).map(|origin| format!("{origin}{href}"))
    }

    fn absolute_or_relative(&self, href: String) -> String {
        self.absolute(&href).unwrap_or(href)
    }
}

/// Write SEO files and return their names in emission order.
pub(crate) fn emit_seo_artifacts(
    ctx: &SeoContext<'_>,
    graph: &SummaryGraph,
    out_dir: &Path,
) -> Result<Vec<String>, BuildError> {
    let mut emitted = Vec::new();

    if let Some(sitemap) = build_sitemap_xml(ctx, graph) {
        write(out_dir, "sitemap.xml", &sitemap)?;
        emitted.push("sitemap.xml".to_owned());
    }

    write(out_dir, "robots.txt", &build_robots_txt(ctx))?;
    emitted.push("robots.txt".to_owned());

    write(out_dir, "llms.txt", &build_llms_txt(ctx, graph))?;
    emitted.push("llms.txt".to_owned());

    Ok(emitted)
}

fn write(out_dir: &Path, name: &str, content: &str) -> Result<(), BuildError> {
    let path = out_dir.join(name);
    std::fs::write(&path, content).map_err(BuildError::io(&path))
}

/// `scheme://host[:port]` part of the site URL.
fn site_origin(url: &str) -> Option<&str> {
    let url = url.trim();
    let scheme_end = url.find("://")? + 3;
    let host_end = url[scheme_end..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |index| scheme_end + index);
    (host_end > scheme_end).then_some(&url[..host_end])
}

fn build_sitemap_xml(ctx: &SeoContext<'_>, graph: &SummaryGraph) -> Option<String> {
    let urls: Vec<String> = graph
        .chapters()
        .filter_map(|c| ctx.absolute(&ctx.href(&encode_path_for_href(&c.chapter.route_path))))
        .collect();
    if urls.is_empty() {
        return None;
    }

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">",
    );
    for url in urls {
        let _ = write!(xml, "<url><loc>{}</loc></url>", escape_html(&url));
    }
    xml.push_str("</urlset>\n");
    Some(xml)
}

fn build_robots_txt(ctx: &SeoContext<'_>) -> String {
    let mut robots = String::from("User-agent: *\nAllow: /\n");
    if let Some(sitemap) = ctx.absolute(&ctx.href("/sitemap.xml")) {
        let _ = writeln!(robots, "Sitemap: {sitemap}");
    }
    robots
}

fn build_llms_txt(ctx: &SeoContext<'_>, graph: &SummaryGraph) -> String {
    let mut lines = vec![format!("# {}", ctx.site.title), String::new()];

    let description = ctx.site.description.trim();
    if !description.is_empty() {
        lines.push(format!("> {description}"));
        lines.push(String::new());
    }

    lines.push(
        "This file follows the llms.txt standard and links to markdown versions of key documentation pages."
            .to_owned(),
    );
    lines.push(String::new());
    lines.push("## Docs".to_owned());
    lines.push(String::new());

    for chapter in graph.chapters() {
        let markdown_href = ctx.href(&format!(
            "/{}",
            encode_path_for_href(&format!("{}.md", chapter.chapter.output_path))
        ));
        lines.push(format!(
            "- [{}]({}): Markdown source for {}",
            chapter.title(),
            ctx.absolute_or_relative(markdown_href),
            chapter.chapter.route_path
        ));
    }

    lines.push(String::new());
    lines.push("## Optional".to_owned());
    lines.push(String::new());
    lines.push(format!(
        "- [llms.txt]({}): Index of LLM-facing docs links",
        ctx.absolute_or_relative(ctx.href("/llms.txt"))
    ));
    lines.push(format!(
        "- [Sitemap]({}): XML sitemap for the documentation site",
        ctx.absolute_or_relative(ctx.href("/sitemap.xml"))
    ));
    lines.push(format!(
        "- [Search Index]({}): Client-side search data",
        ctx.absolute_or_relative(ctx.href(&format!("/{SEARCH_INDEX_FILENAME}")))
    ));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
