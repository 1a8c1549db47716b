//! `quire new` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use quire_book::SUMMARY_FILENAME;
use quire_book::paths::{RelativePathError, normalize_relative};
use quire_config::{CliSettings, Config};

use super::init::title_from_name;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the new command.
#[derive(Args)]
pub(crate) struct NewArgs {
    /// Chapter name or path (`getting started`, `guide/install`, `faq.md`).
    chapter: String,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chapter title (default: derived from the file name).
    #[arg(short, long)]
    title: Option<String>,

    /// Append the chapter to SUMMARY.md.
    #[arg(short, long)]
    summary: bool,

    /// Overwrite an existing chapter file.
    #[arg(short, long)]
    force: bool,
}

impl NewArgs {
    /// Execute the new command.
    ///
    /// # Errors
    ///
    /// Returns an error if the chapter path is empty or leaves the source
    /// directory, the file exists (without `--force`), or writing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&CliSettings::default()))?;
        let src_dir = &config.book_resolved.src_dir;

        let chapter_path = chapter_path(&self.chapter)?;
        let title = self.title.unwrap_or_else(|| {
            title_from_name(chapter_path.rsplit('/').next().unwrap_or(&chapter_path))
        });

        let written = write_chapter(src_dir, &chapter_path, &title, self.force)?;
        output.success(&format!("Created chapter at {}", written.display()));

        if self.summary {
            if append_summary_entry(&src_dir.join(SUMMARY_FILENAME), &title, &chapter_path)? {
                output.info(&format!("Added chapter entry to {SUMMARY_FILENAME}"));
            } else {
                output.info(&format!("{SUMMARY_FILENAME} already lists this chapter"));
            }
        } else {
            output.info(&format!("Remember to add this chapter to {SUMMARY_FILENAME}"));
        }
        Ok(())
    }
}

/// Source-relative path of the new chapter.
///
/// Names ending in `.md` are kept as written; anything else is slugified
/// segment by segment and gets a `.md` extension.
fn chapter_path(input: &str) -> Result<String, CliError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::Validation("Please provide a chapter name".to_owned()));
    }

    let path = if input.ends_with(".md") {
        input.to_owned()
    } else {
        let segments: Vec<String> = input
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(slugify)
            .collect();
        if segments.is_empty() {
            return Err(CliError::Validation(
                "Chapter name resolves to an empty path".to_owned(),
            ));
        }
        format!("{}.md", segments.join("/"))
    };

    normalize_relative(&path).map_err(|err| match err {
        RelativePathError::Empty => {
            CliError::Validation("Chapter name resolves to an empty path".to_owned())
        }
        RelativePathError::Traversal => CliError::Validation(
            "Chapter path must stay inside the source directory".to_owned(),
        ),
    })
}

/// Lowercase ASCII alphanumerics joined by single dashes.
fn slugify(segment: &str) -> String {
    let mut slug = String::with_capacity(segment.len());
    for c in segment.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "chapter".to_owned()
    } else {
        slug
    }
}

fn write_chapter(
    src_dir: &Path,
    chapter_path: &str,
    title: &str,
    force: bool,
) -> Result<PathBuf, CliError> {
    let path = src_dir.join(chapter_path);
    if path.exists() && !force {
        return Err(CliError::Validation(format!(
            "Chapter already exists at `{chapter_path}` (use --force to overwrite)"
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, format!("# {title}\n\nWrite your chapter content here.\n"))?;
    tracing::debug!(path = %path.display(), "Wrote chapter");
    Ok(path)
}

/// Append `- [title](chapter_path)` to the outline.
///
/// Returns `false` when the outline is missing or already has the entry.
fn append_summary_entry(summary_path: &Path, title: &str, chapter_path: &str) -> Result<bool, CliError> {
    if !summary_path.is_file() {
        return Ok(false);
    }
    let mut contents = std::fs::read_to_string(summary_path)?;
    let entry = format!("- [{title}]({chapter_path})");
    if contents.lines().any(|line| line.trim() == entry) {
        return Ok(false);
    }
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&entry);
    contents.push('\n');
    std::fs::write(summary_path, contents)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_chapter_path() {
        assert_eq!(chapter_path("Getting Started").unwrap(), "getting-started.md");
        assert_eq!(chapter_path(" Guide / Install Steps ").unwrap(), "guide/install-steps.md");
        assert_eq!(chapter_path("notes/FAQ.md").unwrap(), "notes/FAQ.md");
        assert_eq!(chapter_path("!!!").unwrap(), "chapter.md");
    }

    #[test]
    fn test_chapter_path_rejects_escape_and_empty() {
        assert!(matches!(chapter_path("../outside.md"), Err(CliError::Validation(_))));
        assert!(matches!(chapter_path("   "), Err(CliError::Validation(_))));
        assert!(matches!(chapter_path("/"), Err(CliError::Validation(_))));
    }

    #[test]
    fn test_title_from_chapter_file() {
        assert_eq!(title_from_name("install-steps.md"), "Install Steps");
    }

    #[test]
    fn test_write_chapter_refuses_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("faq.md"), "mine").unwrap();

        let err = write_chapter(dir.path(), "faq.md", "FAQ", false).unwrap_err();
        assert!(matches!(err, CliError::Validation(msg) if msg.contains("faq.md")));
        assert_eq!(fs::read_to_string(dir.path().join("faq.md")).unwrap(), "mine");

        write_chapter(dir.path(), "faq.md", "FAQ", true).unwrap();
        assert!(fs::read_to_string(dir.path().join("faq.md")).unwrap().starts_with("# FAQ\n"));
    }

    #[test]
    fn test_write_chapter_creates_directories() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_chapter(dir.path(), "guide/install.md", "Install", false).unwrap();

        assert_eq!(path, dir.path().join("guide/install.md"));
        assert!(path.is_file());
    }

    #[test]
    fn test_append_summary_entry_once() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join(SUMMARY_FILENAME);
        fs::write(&summary, "# Summary\n\n- [Intro](README.md)").unwrap();

        assert!(append_summary_entry(&summary, "Install", "guide/install.md").unwrap());
        assert!(!append_summary_entry(&summary, "Install", "guide/install.md").unwrap());

        assert_eq!(
            fs::read_to_string(&summary).unwrap(),
            "# Summary\n\n- [Intro](README.md)\n- [Install](guide/install.md)\n"
        );
    }

    #[test]
    fn test_appended_entry_parses_as_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join(SUMMARY_FILENAME);
        fs::write(&summary, "- [Intro](README.md)\n").unwrap();

        append_summary_entry(&summary, "Install", "guide/install.md").unwrap();

        let graph = quire_book::SummaryGraph::load(dir.path(), true).unwrap();
        let routes: Vec<_> = graph.chapters().map(|c| c.chapter.route_path.clone()).collect();
        assert_eq!(routes, ["/", "/guide/install/"]);
    }

    #[test]
    fn test_missing_summary_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join(SUMMARY_FILENAME);

        assert!(!append_summary_entry(&summary, "Install", "install.md").unwrap());
        assert!(!summary.exists());
    }
}
