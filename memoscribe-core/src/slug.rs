//! Filesystem-safe slugs derived from recording titles.

use unicode_normalization::UnicodeNormalization;

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 64;

/// Slug used when nothing survives filtering.
pub const FALLBACK_SLUG: &str = "voice-memo";

/// Derive a deterministic, filesystem-safe basename component from a
/// free-form title.
///
/// Canonical decomposition first, so accented letters reduce to their base
/// letter once the combining marks are filtered out. Whitespace runs
/// collapse to a single hyphen.
pub fn slugify(title: &str, max_len: usize) -> String {
    let filtered: String = title
        .nfd()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();

    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join("-");
    let trimmed = collapsed.trim_matches(|c| c == '-' || c == '_');
    let truncated: String = trimmed.chars().take(max_len).collect();

    if truncated.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        truncated
    }
}
