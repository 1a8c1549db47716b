//! Markdown to HTML rendering.

use std::collections::HashMap;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::html::{normalize_whitespace, slugify, strip_html};

/// Output of rendering one markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// Rendered HTML fragment.
    pub html: String,
    /// Visible text of the rendered HTML, whitespace-normalized.
    pub plain_text: String,
    /// Text content used for the search index (includes code).
    pub search_text: String,
    /// Headings in document order.
    pub headings: Vec<Heading>,
}

/// A heading of a rendered page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// Level 1-6.
    pub level: u8,
    /// Anchor id, when ids are generated or set explicitly.
    pub id: Option<String>,
    pub text: String,
}

/// Converts markdown source into a [`RenderedPage`].
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> RenderedPage;
}

/// Markdown extensions and heading id generation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderOptions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
    pub smart_punctuation: bool,
    /// Generate `id` attributes for headings without an explicit `{#id}`.
    pub heading_ids: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: true,
            footnotes: false,
            smart_punctuation: false,
            heading_ids: true,
        }
    }
}

/// Renderer backed by `pulldown-cmark`.
#[derive(Clone, Debug, Default)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Parser options for the configured extensions.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_HEADING_ATTRIBUTES;
        let flags = [
            (self.options.tables, Options::ENABLE_TABLES),
            (self.options.strikethrough, Options::ENABLE_STRIKETHROUGH),
            (self.options.tasklists, Options::ENABLE_TASKLISTS),
            (self.options.footnotes, Options::ENABLE_FOOTNOTES),
            (self.options.smart_punctuation, Options::ENABLE_SMART_PUNCTUATION),
        ];
        for (enabled, flag) in flags {
            if enabled {
                options |= flag;
            }
        }
        options
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> RenderedPage {
        let parser = Parser::new_ext(markdown, self.parser_options());

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut headings = Vec::new();
        let mut heading_ids = HeadingIds::default();
        let mut open_heading: Option<(usize, String)> = None;
        let mut search_text = String::new();

        for event in parser {
            match &event {
                Event::Start(Tag::Heading { .. }) => {
                    open_heading = Some((events.len(), String::new()));
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, heading_text)) = open_heading.as_mut() {
                        heading_text.push_str(text);
                    }
                    search_text.push_str(text);
                }
                Event::SoftBreak | Event::HardBreak | Event::End(_) => search_text.push(' '),
                _ => {}
            }

            let closes_heading = matches!(event, Event::End(TagEnd::Heading(_)));
            events.push(event);

            if closes_heading && let Some((start, text)) = open_heading.take() {
                let text = normalize_whitespace(&text);
                if let Some(Event::Start(Tag::Heading { level, id, .. })) = events.get_mut(start) {
                    if id.is_none() && self.options.heading_ids {
                        *id = Some(heading_ids.next(&text).into());
                    }
                    if !text.is_empty() {
                        headings.push(Heading {
                            level: heading_level_to_num(*level),
                            id: id.as_deref().map(str::to_owned),
                            text,
                        });
                    }
                }
            }
        }

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        RenderedPage {
            plain_text: strip_html(&html_output),
            search_text: normalize_whitespace(&search_text),
            html: html_output,
            headings,
        }
    }
}

/// Unique heading ids within one page.
#[derive(Default)]
struct HeadingIds {
    counts: HashMap<String, usize>,
}

impl HeadingIds {
    fn next(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id = "section".to_owned();
        }
        let count = self.counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(markdown: &str) -> RenderedPage {
        MarkdownRenderer::default().render(markdown)
    }

    #[test]
    fn test_render_basic_html() {
        let page = render("Some **bold** text");
        assert_eq!(page.html, "<p>Some <strong>bold</strong> text</p>\n");
        assert_eq!(page.plain_text, "Some bold text");
    }

    #[test]
    fn test_heading_ids_and_headings() {
        let page = render("# Getting Started\n\n## Install `quire`\n\ntext\n");

        assert!(page.html.contains(r#"<h1 id="getting-started">Getting Started</h1>"#));
        assert_eq!(
            page.headings,
            vec![
                Heading {
                    level: 1,
                    id: Some("getting-started".to_owned()),
                    text: "Getting Started".to_owned(),
                },
                Heading {
                    level: 2,
                    id: Some("install-quire".to_owned()),
                    text: "Install quire".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let page = render("## Usage\n\n## Usage\n\n## Usage\n");
        let ids: Vec<_> = page.headings.iter().filter_map(|h| h.id.as_deref()).collect();
        assert_eq!(ids, ["usage", "usage-1", "usage-2"]);
    }

    #[test]
    fn test_explicit_heading_id_kept() {
        let page = render("## Setup {#install}\n");
        assert_eq!(page.headings[0].id.as_deref(), Some("install"));
        assert!(page.html.contains(r#"id="install""#));
    }

    #[test]
    fn test_heading_ids_disabled() {
        let renderer = MarkdownRenderer::new(RenderOptions {
            heading_ids: false,
            ..RenderOptions::default()
        });
        let page = renderer.render("## Usage\n");

        assert_eq!(page.html, "<h2>Usage</h2>\n");
        assert_eq!(page.headings[0].id, None);
    }

    #[test]
    fn test_search_text_includes_code() {
        let page = render("Intro line\nnext line\n\n```\nlet x = 1;\n```\n");
        assert_eq!(page.search_text, "Intro line next line let x = 1;");
    }

    #[test]
    fn test_tables_enabled_by_default() {
        let page = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(page.html.contains("<table>"));
    }

    #[test]
    fn test_links_render_unchanged() {
        let page = render("[Guide](guide.md#setup)");
        assert_eq!(page.html, "<p><a href=\"guide.md#setup\">Guide</a></p>\n");
    }
}
