//! Request path to output file resolution.
//!
//! Maps a URL path onto a file inside the build output directory, trying
//! the candidates that pretty and flat URLs produce. Paths that would leave
//! the output directory never resolve.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use quire_book::paths;
use regex::Regex;

static EXTENSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^./]+$").expect("invalid extension regex"));

/// A file found for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFile {
    pub absolute_path: PathBuf,
    /// `/`-separated path relative to the output directory.
    pub relative_path: String,
}

/// Find the output file for `request_path`.
///
/// `base_path` is the normalized mount point (`/` or `/docs`). Returns `None`
/// for undecodable paths, paths outside the base path, traversal attempts and
/// misses.
pub async fn resolve(
    request_path: &str,
    output_root: &Path,
    base_path: &str,
    pretty_urls: bool,
) -> Option<ResolvedFile> {
    let relative = relative_request_path(request_path, base_path)?;

    for candidate in candidates(&relative, pretty_urls) {
        let absolute_path = output_root.join(&candidate);
        let is_file = tokio::fs::metadata(&absolute_path)
            .await
            .is_ok_and(|m| m.is_file());
        if is_file {
            return Some(ResolvedFile {
                absolute_path,
                relative_path: candidate,
            });
        }
    }

    None
}

/// Decoded request path relative to the base path, with `.` and `..`
/// segments collapsed.
///
/// Malformed percent escapes, NUL bytes and paths that climb above the
/// base path yield `None`.
fn relative_request_path(request_path: &str, base_path: &str) -> Option<String> {
    if !has_valid_escapes(request_path) {
        return None;
    }
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;

    let rest = if base_path == "/" {
        decoded.strip_prefix('/')?
    } else if decoded == base_path || decoded.strip_prefix(base_path) == Some("/") {
        ""
    } else {
        decoded.strip_prefix(base_path)?.strip_prefix('/')?
    };

    if rest.contains('\0') {
        return None;
    }

    let normalized = paths::normalize(&rest.replace('\\', "/"));
    if paths::escapes_root(&normalized) {
        return None;
    }
    match normalized.as_str() {
        "." | "./" => Some(String::new()),
        _ => Some(normalized),
    }
}

/// Whether every `%` in `path` starts a two-digit hex escape.
fn has_valid_escapes(path: &str) -> bool {
    let bytes = path.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let escape = bytes.get(index + 1..index + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            index += 3;
        } else {
            index += 1;
        }
    }
    true
}

/// Files to try for a relative request path, in order, without duplicates.
fn candidates(relative: &str, pretty_urls: bool) -> Vec<String> {
    if relative.is_empty() {
        return vec!["index.html".to_owned()];
    }
    if relative.ends_with('/') {
        return vec![format!("{relative}index.html")];
    }
    if EXTENSION_PATTERN.is_match(relative) {
        return vec![relative.to_owned()];
    }

    let mut list = Vec::with_capacity(4);
    if !pretty_urls {
        list.push(format!("{relative}.html"));
    }
    for candidate in [
        format!("{relative}/index.html"),
        format!("{relative}.html"),
        relative.to_owned(),
    ] {
        if !list.contains(&candidate) {
            list.push(candidate);
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn output() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("guide/index.html"), "guide").unwrap();
        fs::write(dir.path().join("about.html"), "about").unwrap();
        fs::write(dir.path().join("main-0123abcd.css"), "css").unwrap();
        dir
    }

    #[test]
    fn test_relative_request_path_root_base() {
        assert_eq!(relative_request_path("/", "/"), Some(String::new()));
        assert_eq!(relative_request_path("/guide/", "/"), Some("guide/".to_owned()));
        assert_eq!(relative_request_path("/./a//b", "/"), Some("a/b".to_owned()));
        assert_eq!(relative_request_path("guide", "/"), None);
    }

    #[test]
    fn test_relative_request_path_nested_base() {
        assert_eq!(relative_request_path("/docs", "/docs"), Some(String::new()));
        assert_eq!(relative_request_path("/docs/", "/docs"), Some(String::new()));
        assert_eq!(
            relative_request_path("/docs/guide", "/docs"),
            Some("guide".to_owned())
        );
        assert_eq!(relative_request_path("/docsguide", "/docs"), None);
        assert_eq!(relative_request_path("/guide", "/docs"), None);
    }

    #[test]
    fn test_relative_request_path_collapses_parent_segments() {
        assert_eq!(
            relative_request_path("/guide/../index.html", "/"),
            Some("index.html".to_owned())
        );
        assert_eq!(relative_request_path("/a/%2e%2e/b", "/"), Some("b".to_owned()));
        assert_eq!(relative_request_path("/a\\..\\b", "/"), Some("b".to_owned()));
        assert_eq!(relative_request_path("/guide/..", "/"), Some(String::new()));
        assert_eq!(relative_request_path("/a/b/../", "/"), Some("a/".to_owned()));
        assert_eq!(
            relative_request_path("/docs/guide/../about", "/docs"),
            Some("about".to_owned())
        );
    }

    #[test]
    fn test_relative_request_path_rejects_traversal() {
        assert_eq!(relative_request_path("/../secret.txt", "/"), None);
        assert_eq!(relative_request_path("/a/%2e%2e/%2e%2e/b", "/"), None);
        assert_eq!(relative_request_path("/..\\secret.txt", "/"), None);
        assert_eq!(relative_request_path("/docs/../secret.txt", "/docs"), None);
        assert_eq!(relative_request_path("/a%00b", "/"), None);
        assert_eq!(relative_request_path("/%ff", "/"), None);
    }

    #[test]
    fn test_relative_request_path_rejects_malformed_escapes() {
        assert_eq!(relative_request_path("/%zz", "/"), None);
        assert_eq!(relative_request_path("/%4", "/"), None);
        assert_eq!(relative_request_path("/guide%", "/"), None);
        assert_eq!(
            relative_request_path("/my%20page", "/"),
            Some("my page".to_owned())
        );
    }

    #[test]
    fn test_candidates() {
        assert_eq!(candidates("", true), ["index.html"]);
        assert_eq!(candidates("guide/", true), ["guide/index.html"]);
        assert_eq!(candidates("app.js", true), ["app.js"]);
        assert_eq!(
            candidates("guide", true),
            ["guide/index.html", "guide.html", "guide"]
        );
        assert_eq!(
            candidates("guide", false),
            ["guide.html", "guide/index.html", "guide"]
        );
    }

    #[tokio::test]
    async fn test_resolve_pretty_routes() {
        let dir = output();

        let resolved = resolve("/guide", dir.path(), "/", true).await.unwrap();
        assert_eq!(resolved.relative_path, "guide/index.html");
        assert_eq!(resolved.absolute_path, dir.path().join("guide/index.html"));

        let resolved = resolve("/guide/", dir.path(), "/", true).await.unwrap();
        assert_eq!(resolved.relative_path, "guide/index.html");

        let resolved = resolve("/", dir.path(), "/", true).await.unwrap();
        assert_eq!(resolved.relative_path, "index.html");
    }

    #[tokio::test]
    async fn test_resolve_flat_and_assets() {
        let dir = output();

        let resolved = resolve("/about", dir.path(), "/", false).await.unwrap();
        assert_eq!(resolved.relative_path, "about.html");

        let resolved = resolve("/docs/main-0123abcd.css", dir.path(), "/docs", true)
            .await
            .unwrap();
        assert_eq!(resolved.relative_path, "main-0123abcd.css");
    }

    #[tokio::test]
    async fn test_resolve_misses() {
        let dir = output();

        assert_eq!(resolve("/../secret.txt", dir.path(), "/", true).await, None);
        assert_eq!(resolve("/missing", dir.path(), "/", true).await, None);
        // A trailing slash after a file name looks for a directory index.
        assert_eq!(resolve("/guide/index.html/", dir.path(), "/", true).await, None);
    }
}
