//! Beat length control.

use somnia_core::word_count;
use tracing::{debug, instrument, warn};

const SENTENCE_ENDS: [char; 4] = ['.', '!', '?', '…'];

/// Bring an over-long beat back within tolerance.
///
/// Text longer than `target × (1 + tolerance)` words is cut to that many
/// words; when the kept span contains a sentence end, the trailing partial
/// sentence is dropped as well. Short text is returned unchanged.
///
/// # Examples
///
/// ```
/// use somnia_narrative::enforce_length;
///
/// let text = "One two three. Four five six. Seven eight nine ten eleven twelve thirteen.";
/// assert_eq!(enforce_length(text, 8, 0.1), "One two three. Four five six.");
/// assert_eq!(enforce_length("Short.", 100, 0.1), "Short.");
/// ```
#[instrument(skip(text), fields(words = word_count(text)))]
pub fn enforce_length(text: &str, target: usize, tolerance: f64) -> String {
    let words = word_count(text);
    let upper = (target as f64 * (1.0 + tolerance)).floor() as usize;
    let lower = (target as f64 * (1.0 - tolerance)).ceil() as usize;

    if words > upper {
        let kept = text
            .split_whitespace()
            .take(upper)
            .collect::<Vec<_>>()
            .join(" ");
        let trimmed = match kept.rfind(SENTENCE_ENDS) {
            Some(end) => {
                let boundary = end + kept[end..].chars().next().map_or(1, char::len_utf8);
                kept[..boundary].to_string()
            }
            None => kept,
        };
        debug!(
            before = words,
            after = word_count(&trimmed),
            upper,
            "Beat truncated"
        );
        return trimmed;
    }

    if words < lower {
        warn!(words, target, lower, "Beat below length tolerance, keeping as-is");
    }
    text.to_string()
}
