//! Category label sanitization.
//!
//! The backend's category list is whatever its classifier wrote into the
//! `category` column, which sometimes is not a category at all: a whole
//! sentence, markdown emphasis, or a meta-label such as "Article Summary".
//! Those labels are dropped before they reach the preference selector.
use std::collections::HashSet;

use crate::util::{normalize_label, strip_control_chars};

/// Labels longer than this (in characters, after trimming) are rejected.
pub const MAX_CATEGORY_LEN: usize = 30;

/// Markdown emphasis marker that only shows up in generated junk.
const EMPHASIS_MARKER: &str = "**";

/// Case-folded substrings that mark a meta-label rather than a category.
const META_WORDS: &[&str] = &["article", "summary"];

/// Returns true if `label` may be shown as a category.
///
/// A label is rejected if, after trimming, any of these hold:
/// - it is empty
/// - it is longer than [`MAX_CATEGORY_LEN`] characters
/// - it contains `**`
/// - its case-folded form contains "article" or "summary"
///
/// # Examples
///
/// ```
/// use newsdeck::catalog::is_valid_category;
///
/// assert!(is_valid_category("Technology"));
/// assert!(!is_valid_category("Breaking **News**"));
/// assert!(!is_valid_category("Article Summary of the Week"));
/// ```
pub fn is_valid_category(label: &str) -> bool {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.chars().count() > MAX_CATEGORY_LEN {
        return false;
    }
    if trimmed.contains(EMPHASIS_MARKER) {
        return false;
    }
    let folded = trimmed.to_lowercase();
    !META_WORDS.iter().any(|w| folded.contains(w))
}

/// Filter a raw category list down to labels fit for display.
///
/// Control characters are stripped and surrounding whitespace trimmed before
/// the checks. Labels that normalize to the same form (`"Tech"`, `"tech "`)
/// collapse to the first spelling. Backend order is kept.
pub fn sanitize_categories<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut rejected = 0usize;
    let mut out = Vec::new();

    for label in raw {
        let cleaned = strip_control_chars(label.as_ref());
        let trimmed = cleaned.trim();
        if !is_valid_category(trimmed) {
            rejected += 1;
            continue;
        }
        if seen.insert(normalize_label(trimmed)) {
            out.push(trimmed.to_owned());
        }
    }

    if rejected > 0 {
        tracing::debug!(rejected, kept = out.len(), "Filtered malformed category labels");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_category() {
        assert!(is_valid_category("Technology"));
        assert!(is_valid_category("World News"));
        assert!(is_valid_category("  Sports  "));
    }

    #[test]
    fn test_rejects_emphasis() {
        assert!(!is_valid_category("Breaking **News**"));
        assert!(!is_valid_category("**Tech"));
    }

    #[test]
    fn test_rejects_meta_words_any_case() {
        assert!(!is_valid_category("Article Summary of the Week"));
        assert!(!is_valid_category("ARTICLE"));
        assert!(!is_valid_category("Summary"));
        assert!(!is_valid_category("Articles"));
    }

    #[test]
    fn test_length_boundary() {
        let thirty = "a".repeat(30);
        let thirty_one = "a".repeat(31);
        assert!(is_valid_category(&thirty));
        assert!(!is_valid_category(&thirty_one));
        // Measured after trimming
        assert!(is_valid_category(&format!("  {thirty}  ")));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 20 two-byte characters: 40 bytes, 20 characters
        let label = "é".repeat(20);
        assert!(is_valid_category(&label));
    }

    #[test]
    fn test_rejects_blank() {
        assert!(!is_valid_category(""));
        assert!(!is_valid_category("   "));
    }

    #[test]
    fn test_sanitize_keeps_order_and_dedupes() {
        let raw = [
            "Tech",
            "Here is a summary of the article you asked for",
            "Sports",
            "tech ",
            "Breaking **News**",
            "World",
        ];
        assert_eq!(sanitize_categories(raw), vec!["Tech", "Sports", "World"]);
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        let raw = ["\x1b[31mPolitics\x1b[0m"];
        assert_eq!(sanitize_categories(raw), vec!["Politics"]);
    }

    #[test]
    fn test_sanitize_empty_input() {
        let raw: Vec<String> = Vec::new();
        assert!(sanitize_categories(raw).is_empty());
    }
}
