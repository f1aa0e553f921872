//! Final story assembly: TTS markers, whitespace polish and the per-beat
//! schema.

use crate::{DestinationValidator, TtsConfig};
use regex::Regex;
use somnia_core::{Beat, BeatSchema, MediaCues, word_count};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Breath marker inserted between sentences.
pub const BREATHE_MARKER: &str = "[BREATHE]";

static MARKERS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    match Regex::new(r"\[(?:PAUSE:\d+(?:\.\d+)?|BREATHE)\]") {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "Marker pattern failed to compile");
            None
        }
    }
});

/// Pause marker for `seconds`, with one decimal.
pub fn pause_marker(seconds: f64) -> String {
    format!("[PAUSE:{:.1}]", seconds)
}

/// Remove every TTS marker and the blank runs they leave behind.
///
/// # Examples
///
/// ```
/// use somnia_narrative::strip_markers;
///
/// assert_eq!(strip_markers("You rest. [BREATHE] Softly. [PAUSE:2.5]"), "You rest. Softly.");
/// ```
pub fn strip_markers(text: &str) -> String {
    let stripped = match MARKERS.as_ref() {
        Some(re) => re.replace_all(text, ""),
        None => text.into(),
    };
    stripped
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Trim every line and join the non-empty ones with blank lines.
pub fn final_polish(story: &str) -> String {
    story
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Insert a breath marker after every `every` sentences.
pub fn insert_breaths(text: &str, every: usize) -> String {
    let every = every.max(1);
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut sentences = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        let ends_sentence = matches!(c, '.' | '!' | '?' | '…')
            && chars.peek().is_none_or(|next| next.is_whitespace());
        if ends_sentence {
            sentences += 1;
            if sentences % every == 0 && chars.peek().is_some() {
                out.push(' ');
                out.push_str(BREATHE_MARKER);
            }
        }
    }
    out
}

/// Pause lengths between consecutive beats, growing from `pause_min` to
/// `pause_max`.
pub fn pause_schedule(beats: usize, tts: &TtsConfig) -> Vec<f64> {
    let gaps = beats.saturating_sub(1);
    (0..gaps)
        .map(|i| {
            if gaps == 1 {
                tts.pause_min
            } else {
                tts.pause_min + (tts.pause_max - tts.pause_min) * i as f64 / (gaps - 1) as f64
            }
        })
        .collect()
}

/// Final per-beat texts.
///
/// With markers, each beat gets breath markers and every beat but the last
/// ends with a pause marker. Without, any marker a model produced is
/// stripped.
pub fn render_beats<S: AsRef<str>>(texts: &[S], markers: bool, tts: &TtsConfig) -> Vec<String> {
    if !markers {
        return texts.iter().map(|t| strip_markers(t.as_ref())).collect();
    }
    let pauses = pause_schedule(texts.len(), tts);
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let mut rendered = insert_breaths(&strip_markers(text.as_ref()), tts.breathe_every);
            if let Some(pause) = pauses.get(i) {
                rendered.push_str("\n\n");
                rendered.push_str(&pause_marker(*pause));
            }
            rendered
        })
        .collect()
}

/// Join rendered beats into the story text.
pub fn assemble_story<S: AsRef<str>>(rendered: &[S]) -> String {
    let joined = rendered
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n");
    let story = final_polish(&joined);
    debug!(words = word_count(&story), "Story assembled");
    story
}

/// Structured per-beat records with timing at `wpm`.
pub fn build_schema<S: AsRef<str>>(
    beats: &[Beat],
    rendered: &[S],
    wpm: u32,
    destination: &DestinationValidator,
) -> Vec<BeatSchema> {
    let seconds_per_word = 60.0 / f64::from(wpm.max(1));
    let mut start_seconds = 0.0;
    beats
        .iter()
        .zip(rendered)
        .map(|(beat, text)| {
            let text = text.as_ref();
            let words = word_count(&strip_markers(text));
            let estimated_seconds = words as f64 * seconds_per_word;
            let record = BeatSchema {
                index: beat.index,
                text: text.to_string(),
                sensory_mode: beat.sensory_mode,
                waypoint: beat.waypoint.clone(),
                word_count: words,
                start_seconds,
                estimated_seconds,
                media_cues: MediaCues {
                    pause_markers: text.contains("[PAUSE:"),
                    breathe_markers: text.contains(BREATHE_MARKER),
                    destination_promise: destination.detect_promise(text),
                    arrival: destination.detect_arrival(text),
                },
            };
            start_seconds += estimated_seconds;
            record
        })
        .collect()
}
