//! `quire init` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use quire_config::CONFIG_FILENAME;
use serde::Serialize;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the init command.
#[derive(Args)]
pub(crate) struct InitArgs {
    /// Project directory (created if missing).
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Site title (default: derived from the directory name).
    #[arg(short, long)]
    title: Option<String>,

    /// Overwrite existing files.
    #[arg(short, long)]
    force: bool,
}

/// One scaffolded file, relative to the project directory.
struct TemplateFile {
    path: &'static str,
    contents: String,
}

#[derive(Serialize)]
struct InitConfig<'a> {
    site: InitSite<'a>,
    book: InitBook,
}

#[derive(Serialize)]
struct InitSite<'a> {
    title: &'a str,
    description: &'a str,
    language: &'a str,
}

#[derive(Serialize)]
struct InitBook {
    src_dir: &'static str,
    out_dir: &'static str,
    public_dir: &'static str,
}

impl InitArgs {
    /// Execute the init command.
    ///
    /// # Errors
    ///
    /// Returns an error if any scaffold file already exists (without
    /// `--force`) or a file can't be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let title = self.title.unwrap_or_else(|| title_from_dir(&self.dir));
        let files = template_files(&title)?;
        write_scaffold(&self.dir, &files, self.force)?;

        output.success(&format!("Initialized quire project in {}", self.dir.display()));
        output.info("Next steps:");
        output.detail("1", &format!("cd {}", self.dir.display()));
        output.detail("2", "quire dev");
        Ok(())
    }
}

/// Write `files` under `dir`, refusing to replace existing files unless `force`.
fn write_scaffold(dir: &Path, files: &[TemplateFile], force: bool) -> Result<(), CliError> {
    if !force {
        let conflicts: Vec<&str> = files
            .iter()
            .filter(|file| dir.join(file.path).exists())
            .map(|file| file.path)
            .collect();
        if !conflicts.is_empty() {
            return Err(CliError::Validation(format!(
                "Files already exist: {} (use --force to overwrite)",
                conflicts.join(", ")
            )));
        }
    }

    for file in files {
        let path = dir.join(file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &file.contents)?;
        tracing::debug!(path = %path.display(), "Wrote scaffold file");
    }
    Ok(())
}

fn template_files(title: &str) -> Result<Vec<TemplateFile>, CliError> {
    let description = format!("{title} documentation built with quire.");
    let config = toml::to_string(&InitConfig {
        site: InitSite {
            title,
            description: &description,
            language: "en",
        },
        book: InitBook {
            src_dir: "book",
            out_dir: "dist",
            public_dir: "public",
        },
    })
    .map_err(|e| CliError::Validation(format!("Failed to render {CONFIG_FILENAME}: {e}")))?;

    Ok(vec![
        TemplateFile {
            path: CONFIG_FILENAME,
            contents: config,
        },
        TemplateFile {
            path: "book/SUMMARY.md",
            contents: "# Summary\n\n- [Introduction](README.md)\n- [Guide](guide.md)\n".to_owned(),
        },
        TemplateFile {
            path: "book/README.md",
            contents: format!(
                "# {title}\n\nWelcome to your documentation site.\n\n\
                 Run `quire build` to generate static HTML output.\n"
            ),
        },
        TemplateFile {
            path: "book/guide.md",
            contents: "# Guide\n\nThis chapter is a starting point for your docs.\n\n\
                       1. Edit this file.\n\
                       2. Update `book/SUMMARY.md`.\n\
                       3. Run `quire dev` while writing.\n"
                .to_owned(),
        },
        TemplateFile {
            path: "public/.gitkeep",
            contents: String::new(),
        },
    ])
}

/// Title-case the last component of `dir` (`my-docs` becomes `My Docs`).
fn title_from_dir(dir: &Path) -> String {
    let name = std::path::absolute(dir)
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_default();
    title_from_name(&name)
}

/// Title-case a file or directory name, dropping a `.md` extension.
pub(super) fn title_from_name(name: &str) -> String {
    let name = name.strip_suffix(".md").unwrap_or(name);
    let title = name
        .split(['-', '_', ' ', '/'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        "Documentation".to_owned()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_title_from_dir() {
        assert_eq!(title_from_dir(Path::new("/tmp/my-docs")), "My Docs");
        assert_eq!(title_from_dir(Path::new("/tmp/api_reference")), "Api Reference");
        assert_eq!(title_from_dir(Path::new("/")), "Documentation");
    }

    #[test]
    fn test_scaffold_loads_as_config() {
        let dir = tempfile::tempdir().unwrap();
        let files = template_files("Say \"hi\"").unwrap();

        write_scaffold(dir.path(), &files, false).unwrap();

        assert!(dir.path().join("book/SUMMARY.md").is_file());
        assert!(dir.path().join("book/guide.md").is_file());
        assert!(dir.path().join("public/.gitkeep").is_file());
        let config = quire_config::Config::load(Some(&dir.path().join(CONFIG_FILENAME)), None).unwrap();
        assert_eq!(config.site.title, "Say \"hi\"");
        assert_eq!(config.book_resolved.src_dir, dir.path().join("book"));
    }

    #[test]
    fn test_scaffold_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("book")).unwrap();
        fs::write(dir.path().join("book/README.md"), "mine").unwrap();
        let files = template_files("Docs").unwrap();

        let err = write_scaffold(dir.path(), &files, false).unwrap_err();

        assert!(matches!(err, CliError::Validation(msg) if msg.contains("book/README.md")));
        assert_eq!(fs::read_to_string(dir.path().join("book/README.md")).unwrap(), "mine");
        assert!(!dir.path().join(CONFIG_FILENAME).exists());
    }

    #[test]
    fn test_scaffold_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("book")).unwrap();
        fs::write(dir.path().join("book/README.md"), "mine").unwrap();
        let files = template_files("Docs").unwrap();

        write_scaffold(dir.path(), &files, true).unwrap();

        let readme = fs::read_to_string(dir.path().join("book/README.md")).unwrap();
        assert!(readme.starts_with("# Docs\n"));
    }
}
