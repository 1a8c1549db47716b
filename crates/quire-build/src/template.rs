//! HTML page layout for built chapters.
//!
//! Produces a sidebar with the book outline, the rendered chapter, a pager
//! and an "On this page" table of contents. Class names match the bundled
//! stylesheet.

use std::fmt::Write;

use quire_renderer::escape_html as escape;

/// Sidebar item: a section title, a chapter, or a link.
pub(crate) struct NavItemData {
    pub title: String,
    /// `None` for sections.
    pub href: Option<String>,
    pub external: bool,
    pub is_active: bool,
    pub children: Vec<NavItemData>,
}

/// Table of contents entry.
pub(crate) struct TocData {
    pub level: u8,
    pub title: String,
    pub id: String,
}

/// Previous/next chapter link.
pub(crate) struct PagerLink {
    pub title: String,
    pub href: String,
}

/// External profile link in the sidebar footer.
#[derive(Clone)]
pub(crate) struct SocialLink {
    pub label: &'static str,
    pub href: String,
}

/// All data needed to render a page.
pub(crate) struct PageData {
    pub lang: String,
    pub site_title: String,
    pub title: String,
    pub description: String,
    pub canonical_url: Option<String>,
    pub base_path: String,
    pub search_index_href: String,
    pub markdown_href: String,
    pub stylesheet_href: Option<String>,
    pub script_href: Option<String>,
    pub html_content: String,
    pub navigation: Vec<NavItemData>,
    pub toc: Vec<TocData>,
    pub previous: Option<PagerLink>,
    pub next: Option<PagerLink>,
    pub edit_url: Option<String>,
    pub socials: Vec<SocialLink>,
}

/// Render a complete HTML page.
pub(crate) fn render_page(page: &PageData) -> String {
    let mut html = String::with_capacity(8192 + page.html_content.len());

    let _ = writeln!(
        html,
        "<!doctype html>\n<html lang=\"{}\">\n<head>",
        escape(&page.lang)
    );
    render_head(&mut html, page);
    html.push_str("</head>\n<body>\n");

    let app_class = if page.toc.is_empty() {
        "app app-no-toc"
    } else {
        "app"
    };
    let _ = writeln!(html, "<div class=\"{app_class}\">");

    render_sidebar(&mut html, page);

    html.push_str("<main class=\"content\">\n");
    let _ = write!(
        html,
        "<header class=\"content-header\"><small>{}</small> <div class=\"page-actions\">",
        escape(&page.site_title),
    );
    if let Some(edit_url) = &page.edit_url {
        let _ = write!(
            html,
            "<a class=\"page-edit-link\" href=\"{}\" target=\"_blank\" \
             rel=\"noopener noreferrer\">Edit this page</a>",
            escape(edit_url)
        );
    }
    let _ = writeln!(
        html,
        "<a class=\"page-markdown-link\" href=\"{}\">View markdown</a></div></header>",
        escape(&page.markdown_href),
    );
    html.push_str("<article class=\"markdown\">\n");
    html.push_str(&page.html_content);
    html.push_str("\n</article>\n");
    render_pager(&mut html, page.previous.as_ref(), page.next.as_ref());
    html.push_str("</main>\n");

    render_toc(&mut html, &page.toc);

    html.push_str("</div>\n");
    render_search_overlay(&mut html);
    if let Some(script) = &page.script_href {
        let _ = writeln!(html, "<script src=\"{}\" defer></script>", escape(script));
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_head(html: &mut String, page: &PageData) {
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(
        html,
        "<title>{} - {}</title>",
        escape(&page.title),
        escape(&page.site_title)
    );
    html.push_str("<meta name=\"generator\" content=\"quire\">\n");
    let _ = writeln!(
        html,
        "<meta name=\"quire-base-path\" content=\"{}\">",
        escape(&page.base_path)
    );
    let _ = writeln!(
        html,
        "<meta name=\"quire-search-index\" content=\"{}\">",
        escape(&page.search_index_href)
    );
    if !page.description.is_empty() {
        let _ = writeln!(
            html,
            "<meta name=\"description\" content=\"{}\">",
            escape(&page.description)
        );
    }
    let _ = writeln!(
        html,
        "<meta property=\"og:title\" content=\"{}\">",
        escape(&page.title)
    );
    if let Some(canonical) = &page.canonical_url {
        let _ = writeln!(html, "<link rel=\"canonical\" href=\"{}\">", escape(canonical));
    }
    if let Some(stylesheet) = &page.stylesheet_href {
        let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{}\">", escape(stylesheet));
    }
}

fn render_sidebar(html: &mut String, page: &PageData) {
    html.push_str("<aside class=\"sidebar\">\n");
    let _ = writeln!(html, "<p class=\"brand\">{}</p>", escape(&page.site_title));
    html.push_str(
        "<button id=\"quire-search-trigger\" class=\"search-trigger\" type=\"button\" \
         aria-haspopup=\"dialog\" aria-controls=\"quire-search-overlay\" \
         aria-expanded=\"false\">Search docs</button>\n",
    );
    html.push_str("<nav aria-label=\"Chapters\">\n<ul class=\"summary-list\">\n");
    render_nav_items(html, &page.navigation);
    html.push_str("</ul>\n</nav>\n");
    if !page.socials.is_empty() {
        html.push_str("<div class=\"sidebar-footer\"><div class=\"sidebar-socials\">");
        for social in &page.socials {
            let _ = write!(
                html,
                "<a class=\"sidebar-social-link\" href=\"{}\" target=\"_blank\" \
                 rel=\"noopener noreferrer\">{}</a>",
                escape(&social.href),
                social.label
            );
        }
        html.push_str("</div></div>\n");
    }
    html.push_str("</aside>\n");
}

/// Render outline items recursively.
fn render_nav_items(html: &mut String, items: &[NavItemData]) {
    for item in items {
        match &item.href {
            None => {
                let _ = write!(
                    html,
                    "<li class=\"summary-group\"><span class=\"summary-group-title\">{}</span>",
                    escape(&item.title)
                );
            }
            Some(href) => {
                let active = if item.is_active { " is-active" } else { "" };
                let target = if item.external {
                    " target=\"_blank\" rel=\"noopener noreferrer\""
                } else {
                    ""
                };
                let current = if item.is_active {
                    " aria-current=\"page\""
                } else {
                    ""
                };
                let _ = write!(
                    html,
                    "<li class=\"summary-item{active}\"><a href=\"{}\"{target}{current}>{}</a>",
                    escape(href),
                    escape(&item.title)
                );
            }
        }

        if !item.children.is_empty() {
            html.push_str("<ul class=\"summary-list\">\n");
            render_nav_items(html, &item.children);
            html.push_str("</ul>");
        }
        html.push_str("</li>\n");
    }
}

fn render_pager(html: &mut String, previous: Option<&PagerLink>, next: Option<&PagerLink>) {
    if previous.is_none() && next.is_none() {
        return;
    }
    html.push_str("<nav class=\"pager\">");
    for (label, link) in [("Previous", previous), ("Next", next)] {
        match link {
            Some(link) => {
                let _ = write!(
                    html,
                    "<a class=\"pager-link\" href=\"{}\"><span>{label}</span><strong>{}</strong></a>",
                    escape(&link.href),
                    escape(&link.title)
                );
            }
            None => html.push_str("<span class=\"pager-spacer\"></span>"),
        }
    }
    html.push_str("</nav>\n");
}

/// Render the table of contents sidebar.
fn render_toc(html: &mut String, toc: &[TocData]) {
    if toc.is_empty() {
        return;
    }
    html.push_str("<aside class=\"toc\">\n<h2>On this page</h2>\n<ul>\n");
    for entry in toc {
        let _ = writeln!(
            html,
            "<li class=\"toc-item toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape(&entry.id),
            escape(&entry.title),
        );
    }
    html.push_str("</ul>\n</aside>\n");
}

fn render_search_overlay(html: &mut String) {
    html.push_str(
        "<div id=\"quire-search-overlay\" class=\"search-overlay\" hidden>\n\
         <div class=\"search-dialog\" role=\"dialog\" aria-modal=\"true\" aria-label=\"Search documentation\">\n\
         <input id=\"quire-search-input\" type=\"search\" placeholder=\"Search docs...\" autocomplete=\"off\" spellcheck=\"false\">\n\
         <ul id=\"quire-search-results\" class=\"search-results\"></ul>\n\
         </div>\n</div>\n",
    );
}
