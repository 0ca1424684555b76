//! Utility functions for filename sanitization and pretty-printing

use serde::Serialize;

use crate::error::Result;

/// Maximum length (in characters) of a sanitized filename stem
const MAX_FILENAME_LEN: usize = 200;

/// Sanitize a document or folder title for use as a filename
///
/// Replaces characters that are invalid on common filesystems with `_`,
/// strips control characters, collapses leading/trailing whitespace and dots,
/// and truncates overly long names. Falls back to `"untitled"` when nothing
/// usable remains.
///
/// # Examples
///
/// ```
/// use feishu_dl::utils::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("Q3 Roadmap: draft/v2"), "Q3 Roadmap_ draft_v2");
/// assert_eq!(sanitize_file_name("  ../..  "), "untitled");
/// ```
pub fn sanitize_file_name(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    let trimmed = out.trim().trim_matches('.').trim();
    let mut name: String = trimmed.chars().take(MAX_FILENAME_LEN).collect();

    // Names made of only separators and dots sanitize down to nothing
    if name.chars().all(|c| c == '_' || c == ' ' || c == '.') {
        name.clear();
    }

    if name.is_empty() {
        "untitled".to_string()
    } else {
        name
    }
}

/// Serialize a value as pretty-printed JSON
pub fn pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
