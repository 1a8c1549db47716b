//! Build pipeline: clean, assets, pages, search and SEO.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ignore::WalkBuilder;
use quire_book::paths::encode_path_for_href;
use quire_book::{ChapterRef, EntryKind, SummaryEntry, SummaryGraph};
use quire_config::{Config, MarkdownConfig};
use quire_renderer::{MarkdownRenderer, RenderOptions, Renderer};

use crate::bundler::{BundleOptions, BundleOutput, Bundler, CLIENT_ENTRY, EmbeddedBundler};
use crate::edit::edit_url;
use crate::error::BuildError;
use crate::links::rewrite_chapter_links;
use crate::progress::{Phase, ProgressEvent, ProgressSink, Status};
use crate::search::{SEARCH_INDEX_FILENAME, SearchEntry, compact_text, write_search_index};
use crate::seo::{SeoContext, emit_seo_artifacts};
use crate::template::{NavItemData, PageData, PagerLink, SocialLink, TocData, render_page};

const MAX_DESCRIPTION_CHARS: usize = 220;

/// Options for [`build_site`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildOptions {
    /// Minify the client bundle.
    pub minify: bool,
}

/// Wall-clock time spent in each phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildTimings {
    pub total: Duration,
    pub clean: Duration,
    pub assets: Duration,
    pub pages: Duration,
    pub search_seo: Duration,
}

/// Summary of a completed build.
#[derive(Clone, Debug, Default)]
pub struct BuildResult {
    /// Absolute output directory.
    pub out_dir: PathBuf,
    pub page_count: usize,
    pub copied_public_dir: bool,
    pub public_file_count: usize,
    pub client_asset_count: usize,
    pub search_document_count: usize,
    pub markdown_mirror_count: usize,
    /// SEO file names in emission order.
    pub emitted_seo_files: Vec<String>,
    pub timings: BuildTimings,
    /// Every written path relative to `out_dir`, `/`-separated, sorted and unique.
    pub output_files: Vec<String>,
}

/// Map `[markdown]` config onto renderer options.
#[must_use]
pub fn render_options(markdown: &MarkdownConfig) -> RenderOptions {
    RenderOptions {
        tables: markdown.tables,
        strikethrough: markdown.strikethrough,
        tasklists: markdown.tasklists,
        footnotes: markdown.footnotes,
        smart_punctuation: markdown.smart_punctuation,
        heading_ids: markdown.heading_ids,
    }
}

/// Load `SUMMARY.md` and build the site with the built-in renderer and bundler.
///
/// # Errors
///
/// Returns an error if the outline is invalid or any phase fails.
pub fn build_site(
    config: &Config,
    options: &BuildOptions,
    progress: Option<&dyn ProgressSink>,
) -> Result<BuildResult, BuildError> {
    let book = &config.book_resolved;
    let graph = SummaryGraph::load(&book.src_dir, book.pretty_urls)?;
    let renderer = MarkdownRenderer::new(render_options(&config.markdown));

    let mut pipeline =
        ArtifactPipeline::new(config, &renderer, &EmbeddedBundler).with_minify(options.minify);
    if let Some(sink) = progress {
        pipeline = pipeline.with_progress(sink);
    }
    pipeline.run(&graph)
}

/// Runs the build phases against a parsed outline.
///
/// Phases run strictly in order and chapters in document order. The output
/// directory is deleted at the start of every run.
pub struct ArtifactPipeline<'a> {
    config: &'a Config,
    renderer: &'a dyn Renderer,
    bundler: &'a dyn Bundler,
    progress: Option<&'a dyn ProgressSink>,
    minify: bool,
}

/// Mutable state collected while the phases run.
#[derive(Default)]
struct Manifest {
    files: Vec<String>,
}

impl Manifest {
    fn push(&mut self, relative: impl Into<String>) {
        self.files.push(relative.into());
    }

    fn push_absolute(&mut self, out_dir: &Path, path: &Path) {
        if let Some(relative) = relative_output_path(out_dir, path) {
            self.files.push(relative);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.files.sort();
        self.files.dedup();
        self.files
    }
}

impl<'a> ArtifactPipeline<'a> {
    #[must_use]
    pub fn new(config: &'a Config, renderer: &'a dyn Renderer, bundler: &'a dyn Bundler) -> Self {
        Self {
            config,
            renderer,
            bundler,
            progress: None,
            minify: false,
        }
    }

    /// Report phase progress to `sink`.
    #[must_use]
    pub fn with_progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    #[must_use]
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = self.progress {
            sink.emit(event);
        }
    }

    /// Run every phase and return the build summary.
    ///
    /// # Errors
    ///
    /// Stops at the first failing phase. Files written before the failure
    /// stay in the output directory.
    pub fn run(&self, graph: &SummaryGraph) -> Result<BuildResult, BuildError> {
        let started = Instant::now();
        let out_dir = self.config.book_resolved.out_dir.clone();
        let mut manifest = Manifest::default();
        let mut result = BuildResult {
            out_dir: out_dir.clone(),
            ..BuildResult::default()
        };

        let phase_started = Instant::now();
        self.emit(ProgressEvent::start(Phase::Clean));
        clean_output_dir(&out_dir)?;
        self.emit(ProgressEvent::end(Phase::Clean));
        result.timings.clean = phase_started.elapsed();

        let phase_started = Instant::now();
        self.emit(ProgressEvent::start(Phase::Assets));
        let public_files = copy_public_dir(&self.config.book_resolved.public_dir, &out_dir)?;
        if let Some(files) = public_files {
            result.copied_public_dir = true;
            result.public_file_count = files.len();
            manifest.files.extend(files);
        }
        let bundle = self.bundler.bundle(
            CLIENT_ENTRY,
            &BundleOptions {
                out_dir: out_dir.clone(),
                minify: self.minify,
            },
        )?;
        if bundle.script_path.is_none() {
            return Err(BuildError::Bundle(format!(
                "bundle for `{CLIENT_ENTRY}` produced no script"
            )));
        }
        for path in &bundle.outputs {
            manifest.push_absolute(&out_dir, path);
        }
        result.client_asset_count = bundle.outputs.len();
        self.emit(ProgressEvent::end(Phase::Assets));
        result.timings.assets = phase_started.elapsed();

        let phase_started = Instant::now();
        let search_entries = self.write_pages(graph, &out_dir, &bundle, &mut manifest)?;
        result.page_count = search_entries.len();
        result.markdown_mirror_count = search_entries.len();
        result.timings.pages = phase_started.elapsed();

        let phase_started = Instant::now();
        self.emit(ProgressEvent::start(Phase::SearchSeo));
        write_search_index(&out_dir, &search_entries)?;
        manifest.push(SEARCH_INDEX_FILENAME);
        result.search_document_count = search_entries.len();
        let seo = self.seo_context();
        result.emitted_seo_files = emit_seo_artifacts(&seo, graph, &out_dir)?;
        for name in &result.emitted_seo_files {
            manifest.push(name.as_str());
        }
        self.emit(ProgressEvent::end(Phase::SearchSeo));
        result.timings.search_seo = phase_started.elapsed();

        result.timings.total = started.elapsed();
        result.output_files = manifest.finish();

        tracing::info!(
            pages = result.page_count,
            files = result.output_files.len(),
            elapsed_ms = result.timings.total.as_millis(),
            out_dir = %out_dir.display(),
            "Build complete"
        );

        Ok(result)
    }

    fn seo_context(&self) -> SeoContext<'a> {
        SeoContext {
            site: &self.config.site,
            base_path: &self.config.book_resolved.base_path,
        }
    }

    /// Render and write every chapter, returning one search entry per page.
    fn write_pages(
        &self,
        graph: &SummaryGraph,
        out_dir: &Path,
        bundle: &BundleOutput,
        manifest: &mut Manifest,
    ) -> Result<Vec<SearchEntry>, BuildError> {
        let total = graph.chapter_count();
        self.emit(ProgressEvent::start(Phase::Pages).with_counts(None, total));

        let seo = self.seo_context();
        let asset_href = |path: Option<&Path>| {
            path.and_then(|p| relative_output_path(out_dir, p))
                .map(|relative| seo.href(&format!("/{}", encode_path_for_href(&relative))))
        };
        let stylesheet_href = asset_href(bundle.style_path.as_deref());
        let script_href = asset_href(bundle.script_path.as_deref());

        let socials = social_links(self.config);
        let mut search_entries = Vec::with_capacity(total);
        for (index, chapter) in graph.chapters().enumerate() {
            let source_path = &chapter.chapter.source_path;
            if !chapter.chapter.source_absolute_path.is_file() {
                return Err(BuildError::ChapterMissing {
                    source_path: source_path.clone(),
                });
            }
            let markdown = std::fs::read_to_string(&chapter.chapter.source_absolute_path)
                .map_err(BuildError::io(&chapter.chapter.source_absolute_path))?;

            let rendered = self.renderer.render(&markdown);
            let content = rewrite_chapter_links(
                &rendered.html,
                source_path,
                graph,
                &self.config.book_resolved.base_path,
            );

            let page = PageData {
                lang: self.config.site.language.clone(),
                site_title: self.config.site.title.clone(),
                title: chapter.title().to_owned(),
                description: self.page_description(&rendered.plain_text),
                canonical_url: seo
                    .absolute(&seo.href(&encode_path_for_href(&chapter.chapter.route_path))),
                base_path: self.config.book_resolved.base_path.clone(),
                search_index_href: seo.href(&format!("/{SEARCH_INDEX_FILENAME}")),
                markdown_href: seo.href(&format!(
                    "/{}",
                    encode_path_for_href(&format!("{}.md", chapter.chapter.output_path))
                )),
                stylesheet_href: stylesheet_href.clone(),
                script_href: script_href.clone(),
                html_content: content,
                navigation: nav_items(graph.entries(), chapter.id(), &seo),
                toc: rendered
                    .headings
                    .iter()
                    .filter(|h| (2..=3).contains(&h.level))
                    .filter_map(|h| {
                        h.id.as_ref().map(|id| TocData {
                            level: h.level,
                            title: h.text.clone(),
                            id: id.clone(),
                        })
                    })
                    .collect(),
                previous: pager_link(graph, chapter.chapter.previous_chapter_id.as_deref(), &seo),
                next: pager_link(graph, chapter.chapter.next_chapter_id.as_deref(), &seo),
                edit_url: edit_url(self.config, source_path),
                socials: socials.clone(),
            };

            let output_path = &chapter.chapter.output_path;
            write_output(out_dir, output_path, &render_page(&page))?;
            manifest.push(output_path.as_str());

            let mirror_path = format!("{output_path}.md");
            write_output(out_dir, &mirror_path, &markdown)?;
            manifest.push(mirror_path);

            search_entries.push(search_entry(&chapter, &rendered.search_text));

            tracing::debug!(source = %source_path, output = %output_path, "Wrote page");
            self.emit(ProgressEvent {
                phase: Phase::Pages,
                status: Status::Progress,
                current: Some(index + 1),
                total: Some(total),
            });
        }

        self.emit(ProgressEvent::end(Phase::Pages).with_counts(Some(total), total));
        Ok(search_entries)
    }

    /// First 220 characters of the page text, or the site description.
    fn page_description(&self, plain_text: &str) -> String {
        let description = compact_text(plain_text, MAX_DESCRIPTION_CHARS);
        if description.is_empty() {
            self.config.site.description.trim().to_owned()
        } else {
            description
        }
    }
}

fn search_entry(chapter: &ChapterRef<'_>, text: &str) -> SearchEntry {
    SearchEntry::new(
        chapter.id(),
        chapter.title(),
        &chapter.chapter.route_path,
        &chapter.chapter.source_path,
        text,
    )
}

fn nav_items(entries: &[SummaryEntry], active_id: &str, seo: &SeoContext<'_>) -> Vec<NavItemData> {
    entries
        .iter()
        .map(|entry| {
            let (href, external) = match &entry.kind {
                EntryKind::Section => (None, false),
                EntryKind::Link(link) => (Some(seo.href(&link.href)), link.external),
                EntryKind::Chapter(chapter) => (
                    Some(seo.href(&encode_path_for_href(&chapter.route_path))),
                    false,
                ),
            };
            NavItemData {
                title: entry.title.clone(),
                href,
                external,
                is_active: entry.id == active_id,
                children: nav_items(&entry.children, active_id, seo),
            }
        })
        .collect()
}

fn social_links(config: &Config) -> Vec<SocialLink> {
    let socials = &config.site.socials;
    [("GitHub", &socials.github), ("X", &socials.x)]
        .into_iter()
        .filter(|(_, href)| !href.trim().is_empty())
        .map(|(label, href)| SocialLink {
            label,
            href: href.trim().to_owned(),
        })
        .collect()
}

fn pager_link(graph: &SummaryGraph, id: Option<&str>, seo: &SeoContext<'_>) -> Option<PagerLink> {
    let chapter = graph.chapter(id?)?;
    Some(PagerLink {
        title: chapter.title().to_owned(),
        href: seo.href(&encode_path_for_href(&chapter.chapter.route_path)),
    })
}

fn clean_output_dir(out_dir: &Path) -> Result<(), BuildError> {
    match std::fs::remove_dir_all(out_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::io(out_dir)(e)),
    }
    std::fs::create_dir_all(out_dir).map_err(BuildError::io(out_dir))
}

/// Copy the public directory into the output, hidden files included.
///
/// Returns `None` when there is no public directory, otherwise the relative
/// paths of the copied files.
fn copy_public_dir(public_dir: &Path, out_dir: &Path) -> Result<Option<Vec<String>>, BuildError> {
    if !public_dir.is_dir() {
        return Ok(None);
    }

    let mut copied = Vec::new();
    for entry in WalkBuilder::new(public_dir).standard_filters(false).build() {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: public_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(public_dir) else {
            continue;
        };
        let target = out_dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
        }
        std::fs::copy(entry.path(), &target).map_err(BuildError::io(entry.path()))?;
        if let Some(relative) = relative_output_path(out_dir, &target) {
            copied.push(relative);
        }
    }

    tracing::debug!(files = copied.len(), "Copied public directory");
    Ok(Some(copied))
}

fn write_output(out_dir: &Path, relative: &str, content: &str) -> Result<(), BuildError> {
    let path = out_dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
    }
    std::fs::write(&path, content).map_err(BuildError::io(&path))
}

/// `/`-separated path of `path` relative to `out_dir`.
fn relative_output_path(out_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(out_dir).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(segments.join("/"))
}
