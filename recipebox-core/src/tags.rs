//! Tag normalization.
//!
//! Tags are compared in their normalized form everywhere: on recipes, in
//! a user's tag vocabulary, and in listing queries.

use std::collections::BTreeSet;

use crate::error::CoreError;

/// Maximum length of a normalized tag, in characters.
pub const MAX_TAG_LEN: usize = 32;

/// Maximum number of tags on a single recipe.
pub const MAX_RECIPE_TAGS: usize = 20;

/// Normalize a single tag.
///
/// Trims, lowercases and collapses inner whitespace runs to one space.
///
/// # Errors
/// Returns [`CoreError::InvalidTag`] if the result is empty, longer than
/// [`MAX_TAG_LEN`], or contains characters other than alphanumerics,
/// spaces, `-` and `_`.
pub fn normalize_tag(raw: &str) -> Result<String, CoreError> {
    let normalized = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if normalized.is_empty() {
        return Err(CoreError::InvalidTag { tag: raw.to_owned(), reason: "tag is empty".to_owned() });
    }
    if normalized.chars().count() > MAX_TAG_LEN {
        return Err(CoreError::InvalidTag {
            tag: raw.to_owned(),
            reason: format!("longer than {MAX_TAG_LEN} characters"),
        });
    }
    if let Some(bad) = normalized
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_'))
    {
        return Err(CoreError::InvalidTag {
            tag: raw.to_owned(),
            reason: format!("character '{bad}' is not allowed"),
        });
    }
    Ok(normalized)
}

/// Normalize a list of tags into a deduplicated, sorted set.
///
/// # Errors
/// Returns the first [`CoreError::InvalidTag`] encountered.
pub fn normalize_tags<I, S>(raw: I) -> Result<BTreeSet<String>, CoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(|t| normalize_tag(t.as_ref())).collect()
}

/// Parse a comma-separated tag list as it appears in a query string.
///
/// Empty segments are skipped, so `""` and `"a,,b"` are both valid.
///
/// # Errors
/// Returns the first [`CoreError::InvalidTag`] encountered.
pub fn parse_tag_list(csv: &str) -> Result<BTreeSet<String>, CoreError> {
    normalize_tags(csv.split(',').filter(|s| !s.trim().is_empty()))
}
