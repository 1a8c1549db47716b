//! `quire build` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use quire_build::{BuildOptions, BuildResult, Phase, ProgressEvent, ProgressSink, Status, build_site};
use quire_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    src_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// URL path the site is served under (overrides config).
    #[arg(long)]
    base_path: Option<String>,

    /// Minify client assets.
    #[arg(long)]
    minify: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            src_dir: self.src_dir,
            out_dir: self.out_dir,
            base_path: self.base_path,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        config.validate()?;

        output.info(&format!(
            "Source: {}",
            config.book_resolved.src_dir.display()
        ));
        output.info(&format!(
            "Output: {}",
            config.book_resolved.out_dir.display()
        ));

        let result = build_with_progress(&config, &BuildOptions { minify: self.minify }, &output)?;
        print_build_summary(&output, &result);
        Ok(())
    }
}

/// Run a build, showing phase progress on the terminal.
pub(crate) fn build_with_progress(
    config: &Config,
    options: &BuildOptions,
    output: &Output,
) -> Result<BuildResult, CliError> {
    let reporter = ProgressReporter { output };
    let result = build_site(config, options, Some(&reporter as &dyn ProgressSink));
    output.end_status();
    Ok(result?)
}

/// Prints build progress on a single terminal line.
struct ProgressReporter<'a> {
    output: &'a Output,
}

impl ProgressSink for ProgressReporter<'_> {
    fn emit(&self, event: ProgressEvent) {
        let message = match (event.phase, event.status, event.current, event.total) {
            (Phase::Pages, Status::Progress, Some(current), Some(total)) => {
                format!("Rendering pages {current}/{total}")
            }
            (phase, Status::Start, _, _) => format!("{}...", phase_label(phase)),
            _ => return,
        };
        self.output.status(&message);
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Clean => "Cleaning output",
        Phase::Assets => "Copying public files and bundling assets",
        Phase::Pages => "Rendering pages",
        Phase::SearchSeo => "Writing search index and SEO files",
    }
}

/// Print counts and per-phase timings of a finished build.
pub(crate) fn print_build_summary(output: &Output, result: &BuildResult) {
    output.success(&format!(
        "Built {} page(s) to {}",
        result.page_count,
        result.out_dir.display()
    ));
    if result.copied_public_dir {
        output.detail("Public files", &result.public_file_count.to_string());
    }
    output.detail("Client assets", &result.client_asset_count.to_string());
    output.detail("Markdown mirrors", &result.markdown_mirror_count.to_string());
    output.detail("Search documents", &result.search_document_count.to_string());
    output.detail("SEO files", &result.emitted_seo_files.join(", "));
    output.detail(
        "Timings",
        &format!(
            "clean {}, assets {}, pages {}, search/seo {}, total {}",
            format_duration(result.timings.clean),
            format_duration(result.timings.assets),
            format_duration(result.timings.pages),
            format_duration(result.timings.search_seo),
            format_duration(result.timings.total),
        ),
    );
}

fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_build_args_parse() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: BuildArgs,
        }

        let wrapper =
            Wrapper::parse_from(["quire", "-s", "docs", "-o", "site", "--base-path", "/docs", "--minify"]);
        assert_eq!(wrapper.args.src_dir, Some(PathBuf::from("docs")));
        assert_eq!(wrapper.args.out_dir, Some(PathBuf::from("site")));
        assert_eq!(wrapper.args.base_path.as_deref(), Some("/docs"));
        assert!(wrapper.args.minify);
    }
}
