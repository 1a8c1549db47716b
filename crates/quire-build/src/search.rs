//! Client-side search index.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use quire_renderer::normalize_whitespace;
use serde::Serialize;

use crate::error::BuildError;

/// File name of the search index in the output directory.
pub const SEARCH_INDEX_FILENAME: &str = "search-index.json";

const SEARCH_INDEX_VERSION: u32 = 1;
const MAX_TEXT_CHARS: usize = 4000;

/// One page of the search index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub id: String,
    pub title: String,
    pub route_path: String,
    pub source_path: String,
    pub text: String,
}

impl SearchEntry {
    /// Create an entry with whitespace-normalized text capped at 4000 characters.
    pub fn new(id: &str, title: &str, route_path: &str, source_path: &str, text: &str) -> Self {
        Self {
            id: id.to_owned(),
            title: title.trim().to_owned(),
            route_path: route_path.trim().to_owned(),
            source_path: source_path.trim().to_owned(),
            text: compact_text(text, MAX_TEXT_CHARS),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchIndex<'a> {
    version: u32,
    generated_at: String,
    pages: &'a [SearchEntry],
}

/// Write `search-index.json` into `out_dir`.
pub(crate) fn write_search_index(out_dir: &Path, entries: &[SearchEntry]) -> Result<(), BuildError> {
    let index = SearchIndex {
        version: SEARCH_INDEX_VERSION,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        pages: entries,
    };
    let json = serde_json::to_string(&index)?;
    let path = out_dir.join(SEARCH_INDEX_FILENAME);
    std::fs::write(&path, json).map_err(BuildError::io(&path))
}

/// Normalize whitespace and cut to `max_chars`, ending with `...` when cut.
pub(crate) fn compact_text(text: &str, max_chars: usize) -> String {
    let normalized = normalize_whitespace(text);
    if normalized.chars().count() <= max_chars {
        return normalized;
    }
    let mut cut: String = normalized.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
