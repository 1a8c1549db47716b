//! Markdown rendering for quire pages.
//!
//! The build talks to the renderer through the [`Renderer`] trait. The
//! bundled [`MarkdownRenderer`] is backed by `pulldown-cmark`.
//!
//! # Example
//!
//! ```
//! use quire_renderer::{MarkdownRenderer, RenderOptions, Renderer};
//!
//! let renderer = MarkdownRenderer::new(RenderOptions::default());
//! let page = renderer.render("# Hello\n\n**Bold** text");
//!
//! assert_eq!(page.headings[0].id.as_deref(), Some("hello"));
//! assert_eq!(page.plain_text, "Hello Bold text");
//! ```

mod html;
mod renderer;

pub use html::{escape_html, normalize_whitespace, slugify, strip_html};
pub use renderer::{Heading, MarkdownRenderer, RenderOptions, RenderedPage, Renderer};
