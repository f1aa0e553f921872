//! Story requests and the result object handed back to callers.

use crate::{CoherenceStats, Outline, SensoryMode, StoryMetrics};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// What the caller wants a story about.
///
/// # Examples
///
/// ```
/// use somnia_core::StoryRequest;
///
/// let request = StoryRequest::builder()
///     .theme("tranquil forest")
///     .duration_minutes(10)
///     .seed(7)
///     .build();
///
/// assert_eq!(request.duration_minutes, 10);
/// assert_eq!(request.seed, Some(7));
/// assert!(!request.strict_schema);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct StoryRequest {
    /// Free-text theme.
    #[builder(setter(into))]
    pub theme: String,
    /// Optional longer description.
    #[serde(default)]
    #[builder(default, setter(into, strip_option))]
    pub description: Option<String>,
    /// Target narration length.
    #[builder(default = 45)]
    pub duration_minutes: u32,
    /// Waypoints overriding the extracted ones.
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub custom_waypoints: Option<Vec<String>>,
    /// Seed for reproducible phrase selection.
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,
    /// Emit the per-beat schema.
    #[serde(default)]
    #[builder(default)]
    pub strict_schema: bool,
    /// Keep (and insert) TTS pause/breath markers.
    #[serde(default)]
    #[builder(default)]
    pub tts_markers: bool,
}

/// Media cue flags for one beat of the strict schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaCues {
    /// Text contains `[PAUSE:x.x]` markers.
    pub pause_markers: bool,
    /// Text contains `[BREATHE]` markers.
    pub breathe_markers: bool,
    /// Beat carries the destination promise.
    pub destination_promise: bool,
    /// Beat carries arrival language.
    pub arrival: bool,
}

/// Structured per-beat record for downstream production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatSchema {
    /// Beat position (0-based).
    pub index: usize,
    /// Final text.
    pub text: String,
    /// Sensory channel.
    pub sensory_mode: SensoryMode,
    /// Waypoint label.
    pub waypoint: String,
    /// Words in the beat.
    pub word_count: usize,
    /// Offset of the beat in the narration.
    pub start_seconds: f64,
    /// Narration time of the beat.
    pub estimated_seconds: f64,
    /// Media cue flags.
    pub media_cues: MediaCues,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryResult {
    /// Assembled story text.
    pub story_text: String,
    /// Human-readable outline summary.
    pub outline_summary: String,
    /// Outline the story was generated from.
    pub outline: Outline,
    /// Run metrics.
    pub metrics: StoryMetrics,
    /// Coherence and destination statistics.
    pub coherence: CoherenceStats,
    /// Per-beat schema when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beats_schema: Option<Vec<BeatSchema>>,
}
