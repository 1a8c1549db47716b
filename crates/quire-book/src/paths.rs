//! Path and href helpers shared by the outline parser, the build and the server.
//!
//! All paths handled here are `/`-separated relative paths inside the source
//! or output root. Normalization never touches the filesystem.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

static EXTERNAL_HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*:|#|//)").expect("invalid external href regex")
});

static MARKDOWN_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(md|markdown|mdown)$").expect("invalid markdown path regex")
});

/// Characters left intact when encoding a single href segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Href split into path, query (with `?`) and fragment (with `#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HrefParts<'a> {
    pub path: &'a str,
    pub query: &'a str,
    pub fragment: &'a str,
}

/// Split an href into its path, query and fragment parts.
pub fn split_href(href: &str) -> HrefParts<'_> {
    let (before_fragment, fragment) = match href.find('#') {
        Some(index) => href.split_at(index),
        None => (href, ""),
    };
    let (path, query) = match before_fragment.find('?') {
        Some(index) => before_fragment.split_at(index),
        None => (before_fragment, ""),
    };
    HrefParts {
        path,
        query,
        fragment,
    }
}

/// Whether the href has a scheme, is fragment-only, or is protocol-relative.
pub fn is_external_href(href: &str) -> bool {
    EXTERNAL_HREF_PATTERN.is_match(href.trim())
}

/// Whether the path ends with a markdown extension (case-insensitive).
pub fn is_markdown_path(path: &str) -> bool {
    MARKDOWN_PATH_PATTERN.is_match(path)
}

/// Whether the path part of an href (query and fragment ignored) is markdown.
pub fn is_markdown_href(href: &str) -> bool {
    is_markdown_path(split_href(href.trim()).path)
}

/// Remove a trailing markdown extension, if any.
pub fn strip_markdown_extension(path: &str) -> &str {
    match MARKDOWN_PATH_PATTERN.find(path) {
        Some(found) => &path[..found.start()],
        None => path,
    }
}

/// Collapse `.` and `..` segments and repeated separators.
///
/// Leading `..` segments that cannot be collapsed are kept, so callers can
/// detect an escape with [`escapes_root`]. A trailing `/` is preserved.
/// A path that collapses to nothing becomes `.` (or `/` when absolute).
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let trailing = path.len() > 1 && path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut normalized = segments.join("/");
    if absolute {
        normalized.insert(0, '/');
    }
    if normalized.is_empty() {
        return ".".to_owned();
    }
    if trailing && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Whether a normalized relative path points outside its root.
pub fn escapes_root(normalized: &str) -> bool {
    normalized == ".." || normalized.starts_with("../")
}

/// Error returned by [`normalize_relative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePathError {
    /// Nothing left after normalization.
    Empty,
    /// The path resolves outside its root.
    Traversal,
}

/// Normalize an outline href to a root-relative source path.
///
/// The query and fragment are dropped, backslashes become `/`, one leading
/// `./` or `/` (and one more `/`) is stripped before collapsing segments.
pub fn normalize_relative(href: &str) -> Result<String, RelativePathError> {
    let path = split_href(href.trim()).path.replace('\\', "/");

    let mut rest = path
        .strip_prefix("./")
        .or_else(|| path.strip_prefix('/'))
        .unwrap_or(&path);
    rest = rest.strip_prefix('/').unwrap_or(rest);

    if rest.is_empty() {
        return Err(RelativePathError::Empty);
    }
    let normalized = normalize(rest);
    if normalized == "." {
        return Err(RelativePathError::Empty);
    }
    if escapes_root(&normalized) {
        return Err(RelativePathError::Traversal);
    }
    Ok(normalized)
}

/// Resolve `target` against the directory containing `current`.
///
/// A leading `/` in `target` makes it root-relative. Returns `None` when the
/// result escapes the root.
pub fn join_relative(current: &str, target: &str) -> Option<String> {
    let target = target.replace('\\', "/");
    let joined = if let Some(root_relative) = target.strip_prefix('/') {
        root_relative.to_owned()
    } else {
        match current.rfind('/') {
            Some(index) => format!("{}/{target}", &current[..index]),
            None => target,
        }
    };

    let normalized = normalize(&joined);
    if escapes_root(&normalized) {
        return None;
    }
    Some(normalized)
}

/// Prefix a site href with the base path.
///
/// `base_path` is expected in normalized form (`/` or `/docs`). External
/// hrefs are returned unchanged.
pub fn to_base_path_href(base_path: &str, href: &str) -> String {
    if is_external_href(href) {
        return href.to_owned();
    }
    let base = if base_path == "/" { "" } else { base_path };
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

/// Percent-encode every segment of a `/`-separated path.
pub fn encode_path_for_href(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
