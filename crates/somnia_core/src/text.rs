//! Small text helpers shared by every crate that counts or splits prose.

/// Number of whitespace-separated words.
///
/// # Examples
///
/// ```
/// assert_eq!(somnia_core::word_count("  the  quiet\npath "), 3);
/// assert_eq!(somnia_core::word_count(""), 0);
/// ```
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into trimmed, non-empty sentences on `.`, `!` and `?`.
///
/// # Examples
///
/// ```
/// let sentences = somnia_core::split_sentences("Walk on. Breathe!  Rest?");
/// assert_eq!(sentences, vec!["Walk on", "Breathe", "Rest"]);
/// ```
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
