//! Text metrics for generated drafts.
//!
//! Drafts carry light HTML paragraph markup (`<p>`, `<strong>`). Length is
//! measured the way Korean publishing platforms count it: tags removed, then
//! every whitespace character removed, then characters (not bytes) counted.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex must compile"));

/// Remove markup tags, keeping the text between them.
pub fn strip_tags(content: &str) -> String {
    TAG_RE.replace_all(content, "").into_owned()
}

/// Remove markup tags and all whitespace.
///
/// `"<p>안녕 하세요</p>"` → `"안녕하세요"`
pub fn strip_content(content: &str) -> String {
    strip_tags(content)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Character count of [`strip_content`].
pub fn stripped_char_count(content: &str) -> usize {
    strip_tags(content)
        .chars()
        .filter(|c| !c.is_whitespace())
        .count()
}

/// Minimum acceptable stripped length for a target: floor(0.9 × target).
pub fn minimum_length(target: u32) -> usize {
    (target as usize * 9) / 10
}

/// Truncate to at most `max` characters on a char boundary, for log previews.
pub fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
