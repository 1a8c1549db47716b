//! HTML text helpers.

use std::sync::LazyLock;

use regex::Regex;

static STYLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style.*?</style>").expect("invalid style regex"));

static SCRIPT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script.*?</script>").expect("invalid script regex"));

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("invalid tag regex"));

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Drop tags (and the bodies of `<style>`/`<script>`) and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let without_styles = STYLE_PATTERN.replace_all(html, " ");
    let without_scripts = SCRIPT_PATTERN.replace_all(&without_styles, " ");
    let without_tags = TAG_PATTERN.replace_all(&without_scripts, " ");
    normalize_whitespace(&without_tags)
}

/// Collapse whitespace runs to a single space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convert text to a URL-safe anchor id.
///
/// ASCII letters and digits are kept (lowercased); whitespace, `-` and `_`
/// become a single dash; everything else is dropped.
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<style>p{}</style><p>Hello <b>world</b></p>\n<script>x()</script><p>again</p>"),
            "Hello world again"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  API_v2 -- Reference "), "api-v2-reference");
        assert_eq!(slugify("日本語"), "");
    }
}
