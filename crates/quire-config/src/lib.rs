//! Configuration management for quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! Every call to [`Config::load`] re-reads the file from disk, so a long
//! running process (the dev loop) always sees the latest content.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.url`
//! - `book.base_path`
//! - `server.host`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Clone, Debug, Default)]
pub struct CliSettings {
    /// Override markdown source directory.
    pub src_dir: Option<PathBuf>,
    /// Override output directory.
    pub out_dir: Option<PathBuf>,
    /// Override base path.
    pub base_path: Option<String>,
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "quire.toml";

/// Application configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site metadata.
    pub site: SiteConfig,
    /// Book layout configuration (paths are relative strings from TOML).
    book: BookConfigRaw,
    /// Server configuration.
    pub server: ServerConfig,
    /// Dev loop configuration.
    pub dev: DevConfig,
    /// Markdown rendering options.
    pub markdown: MarkdownConfig,

    /// Resolved book configuration (set after loading).
    #[serde(skip)]
    pub book_resolved: BookConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site metadata used by page layout and SEO artifacts.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,
    /// Short site description.
    pub description: String,
    /// Language code for the `lang` attribute.
    pub language: String,
    /// Public site URL (empty when unknown). Stored without trailing slash.
    pub url: String,
    /// Profile links shown in the sidebar footer.
    pub socials: SocialsConfig,
    /// Base URL that source paths are appended to for "Edit this page".
    ///
    /// When empty, the edit link is derived from `socials.github`.
    pub github_edit_base_url: String,
    /// Branch used for links derived from `socials.github`.
    pub github_edit_branch: String,
    /// Repository directory holding the book sources (default: the source dir).
    pub github_edit_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Documentation".to_owned(),
            description: String::new(),
            language: "en".to_owned(),
            url: String::new(),
            socials: SocialsConfig::default(),
            github_edit_base_url: String::new(),
            github_edit_branch: "main".to_owned(),
            github_edit_path: String::new(),
        }
    }
}

/// Social profile URLs (empty when unset).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SocialsConfig {
    pub github: String,
    pub x: String,
}

/// Raw book configuration as parsed from TOML (paths as strings).
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
struct BookConfigRaw {
    src_dir: Option<String>,
    out_dir: Option<String>,
    public_dir: Option<String>,
    base_path: Option<String>,
    pretty_urls: Option<bool>,
}

/// Resolved book configuration with absolute paths.
#[derive(Clone, Debug)]
pub struct BookConfig {
    /// Source directory containing `SUMMARY.md` and chapters.
    pub src_dir: PathBuf,
    /// Output directory, fully owned by the build.
    pub out_dir: PathBuf,
    /// Public assets directory copied verbatim into the output.
    pub public_dir: PathBuf,
    /// URL prefix the site is mounted under (`/` or `/docs`).
    pub base_path: String,
    /// Address chapters by directory (`/guide/`) instead of `.html` files.
    pub pretty_urls: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

impl BookConfig {
    fn with_base(base: &Path) -> Self {
        Self {
            src_dir: base.join("book"),
            out_dir: base.join("dist"),
            public_dir: base.join("public"),
            base_path: "/".to_owned(),
            pretty_urls: true,
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 4000,
        }
    }
}

/// Dev loop configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    /// Quiet period after a filesystem change before a rebuild starts.
    pub debounce_ms: u64,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self { debounce_ms: 120 }
    }
}

/// Markdown rendering options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct MarkdownConfig {
    /// GFM tables.
    pub tables: bool,
    /// `~~strikethrough~~`.
    pub strikethrough: bool,
    /// `- [ ] task` lists.
    pub tasklists: bool,
    /// Footnote references and definitions.
    pub footnotes: bool,
    /// Typographic quotes and dashes.
    pub smart_punctuation: bool,
    /// Generate `id` attributes for headings.
    pub heading_ids: bool,
}

impl Default for MarkdownConfig {
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

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.url`").
        field: String,
        /// Error message (e.g., "${`SITE_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Normalize a base path to `/` or `/segment[/segment]` without trailing slash.
#[must_use]
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim();
    if trimmed.is_empty() {
        return "/".to_owned();
    }

    let mut value = if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    };

    while value.len() > 1 && value.ends_with('/') {
        value.pop();
    }

    value
}

/// Strip whitespace and a trailing slash from the site URL.
fn normalize_site_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Create default config with paths relative to given base directory.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfig::default(),
            book: BookConfigRaw::default(),
            server: ServerConfig::default(),
            dev: DevConfig::default(),
            markdown: MarkdownConfig::default(),
            book_resolved: BookConfig::with_base(base),
            config_path: None,
        }
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let base = self.base_dir();
        if let Some(src_dir) = &settings.src_dir {
            self.book_resolved.src_dir = base.join(src_dir);
        }
        if let Some(out_dir) = &settings.out_dir {
            self.book_resolved.out_dir = base.join(out_dir);
        }
        if let Some(base_path) = &settings.base_path {
            self.book_resolved.base_path = normalize_base_path(base_path);
        }
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
    }

    /// Source directory as a `/`-separated path relative to the config file.
    ///
    /// Falls back to the configured value (or `book`) when the source
    /// directory lies outside the config file's directory.
    #[must_use]
    pub fn relative_src_dir(&self) -> String {
        let relative = self
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .and_then(|dir| self.book_resolved.src_dir.strip_prefix(dir).ok())
            .map(|path| {
                path.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            });
        relative
            .filter(|path| !path.is_empty())
            .or_else(|| self.book.src_dir.clone())
            .unwrap_or_else(|| "book".to_owned())
    }

    /// Directory that relative CLI paths are resolved against.
    fn base_dir(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| {
            self.config_path
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_default()
        })
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        self.validate_server()?;
        self.validate_dev()?;
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.title, "site.title")?;
        require_non_empty(&self.site.language, "site.language")?;
        let urls = [
            (&self.site.url, "site.url"),
            (&self.site.socials.github, "site.socials.github"),
            (&self.site.socials.x, "site.socials.x"),
            (&self.site.github_edit_base_url, "site.github_edit_base_url"),
        ];
        for (url, field) in urls {
            if !url.trim().is_empty() {
                require_http_url(url.trim(), field)?;
            }
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_dev(&self) -> Result<(), ConfigError> {
        const MAX_DEBOUNCE_MS: u64 = 10_000;

        if self.dev.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "dev.debounce_ms must be greater than 0".to_owned(),
            ));
        }
        if self.dev.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "dev.debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.url = expand::expand_env(&self.site.url, "site.url")?;
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref base_path) = self.book.base_path {
            self.book.base_path = Some(expand::expand_env(base_path, "book.base_path")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.book_resolved = BookConfig {
            src_dir: resolve(self.book.src_dir.as_deref(), "book"),
            out_dir: resolve(self.book.out_dir.as_deref(), "dist"),
            public_dir: resolve(self.book.public_dir.as_deref(), "public"),
            base_path: normalize_base_path(self.book.base_path.as_deref().unwrap_or("/")),
            pretty_urls: self.book.pretty_urls.unwrap_or(true),
        };
        self.site.url = normalize_site_url(&self.site.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.site.title, "Documentation");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.book_resolved.src_dir, PathBuf::from("/test/book"));
        assert_eq!(config.book_resolved.out_dir, PathBuf::from("/test/dist"));
        assert_eq!(
            config.book_resolved.public_dir,
            PathBuf::from("/test/public")
        );
        assert_eq!(config.book_resolved.base_path, "/");
        assert!(config.book_resolved.pretty_urls);
        assert_eq!(config.dev.debounce_ms, 120);
        assert!(config.markdown.heading_ids);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.site.language, "en");
    }

    #[test]
    fn test_parse_site_config() {
        let toml = r#"
[site]
title = "Team Handbook"
description = "How we work"
url = "https://handbook.example.com/"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.site.title, "Team Handbook");
        assert_eq!(config.site.description, "How we work");
        assert_eq!(config.site.url, "https://handbook.example.com");
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[book]
src_dir = "docs"
out_dir = "site"
public_dir = "static"
base_path = "handbook/"
pretty_urls = false
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.book_resolved.src_dir, PathBuf::from("/project/docs"));
        assert_eq!(config.book_resolved.out_dir, PathBuf::from("/project/site"));
        assert_eq!(
            config.book_resolved.public_dir,
            PathBuf::from("/project/static")
        );
        assert_eq!(config.book_resolved.base_path, "/handbook");
        assert!(!config.book_resolved.pretty_urls);
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path(""), "/");
        assert_eq!(normalize_base_path("/"), "/");
        assert_eq!(normalize_base_path("docs"), "/docs");
        assert_eq!(normalize_base_path("/docs/"), "/docs");
        assert_eq!(normalize_base_path("  /a/b//  "), "/a/b");
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_validate_rejects_non_http_site_url() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.site.url = "ftp://example.com".to_owned();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("site.url"));
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.dev.debounce_ms = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dev.debounce_ms"));
    }

    #[test]
    fn test_apply_cli_settings_port_and_host() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(9000),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_apply_cli_settings_base_path() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            base_path: Some("docs/".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.book_resolved.base_path, "/docs");
    }

    #[test]
    fn test_apply_cli_settings_absolute_out_dir() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            out_dir: Some(PathBuf::from("/tmp/site")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.book_resolved.out_dir, PathBuf::from("/tmp/site"));
        assert_eq!(config.book_resolved.src_dir, PathBuf::from("/test/book"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/quire.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[book]\nsrc_dir = \"docs\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.book_resolved.src_dir, dir.path().join("docs"));
        assert_eq!(config.book_resolved.out_dir, dir.path().join("dist"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_rereads_changed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[site]\ntitle = \"First\"\n").unwrap();
        let first = Config::load(Some(&path), None).unwrap();

        std::fs::write(&path, "[site]\ntitle = \"Second\"\n").unwrap();
        let second = Config::load(Some(&path), None).unwrap();

        assert_eq!(first.site.title, "First");
        assert_eq!(second.site.title, "Second");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[site\ntitle = 1").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_expand_env_vars_site_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("QUIRE_TEST_SITE_URL", "https://docs.test.com");
        }

        let toml = r#"
[site]
url = "${QUIRE_TEST_SITE_URL}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.site.url, "https://docs.test.com");

        unsafe {
            std::env::remove_var("QUIRE_TEST_SITE_URL");
        }
    }

    #[test]
    fn test_site_socials_and_edit_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[site]\ngithub_edit_branch = \"trunk\"\n\n[site.socials]\ngithub = \"https://github.com/acme/docs\"\n\n[book]\nsrc_dir = \"content/book\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.site.socials.github, "https://github.com/acme/docs");
        assert_eq!(config.site.socials.x, "");
        assert_eq!(config.site.github_edit_branch, "trunk");
        assert_eq!(config.site.github_edit_base_url, "");
        assert_eq!(config.relative_src_dir(), "content/book");
    }

    #[test]
    fn test_default_edit_branch_and_src_dir() {
        let config = Config::default_with_base(Path::new("/site"));
        assert_eq!(config.site.github_edit_branch, "main");
        assert_eq!(config.relative_src_dir(), "book");
    }

    #[test]
    fn test_validate_rejects_non_http_social_url() {
        let mut config = Config::default_with_base(Path::new("/site"));
        config.site.socials.x = "x.com/acme".to_owned();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("site.socials.x")));
    }
}
