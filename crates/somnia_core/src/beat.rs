//! Beat records produced by the stage pipeline.

use crate::SensoryMode;
use serde::{Deserialize, Serialize};

/// Templated micro-plan guiding one beat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeatPlan {
    /// Where the listener is right now.
    pub current_state: String,
    /// The small goal of this beat.
    pub micro_goal: String,
    /// The one gentle change that happens.
    pub gentle_change: String,
    /// How the beat settles before handing over.
    pub settling: String,
}

impl BeatPlan {
    /// Render the plan as a prompt block.
    pub fn render(&self) -> String {
        format!(
            "RECURSIVE PLAN:\n- Current state: {}\n- Micro-goal: {}\n- Gentle change: {}\n- Settling: {}",
            self.current_state, self.micro_goal, self.gentle_change, self.settling
        )
    }
}

/// Word counts observed after each stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageWordCounts {
    /// Words produced by the generator stage.
    pub generator: usize,
    /// Words after the reasoner stage (0 when skipped).
    pub reasoner: usize,
    /// Words after the polisher stage (0 when skipped).
    pub polisher: usize,
}

/// One narrative segment of a story.
///
/// A beat is immutable once validated; the corrective pass replaces the whole
/// record rather than editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Position in the story (0-based).
    pub index: usize,
    /// Title from the outline.
    pub title: String,
    /// Generated text.
    pub text: String,
    /// Sensory channel this beat is anchored in.
    pub sensory_mode: SensoryMode,
    /// Waypoint label guiding the setting.
    pub waypoint: String,
    /// Word target after the density factor was applied.
    pub target_words: usize,
    /// Words actually produced.
    pub word_count: usize,
    /// Taper multiplier (1.0 before the taper starts).
    pub density_factor: f64,
    /// Plan the beat was generated from.
    pub plan: BeatPlan,
    /// Word counts per stage.
    pub stage_words: StageWordCounts,
    /// True when inference failed and the text is a placeholder.
    pub degraded: bool,
}
