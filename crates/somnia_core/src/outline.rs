//! Theme analysis and outline shapes returned by the outline model.
//!
//! Everything here is deserialized from model output, so every optional
//! field carries a serde default.

use crate::StoryBible;
use serde::{Deserialize, Serialize};

fn default_mood() -> String {
    "peaceful".to_string()
}

/// Enriched theme produced by the theme-analysis call.
///
/// `setting`, `mood` and `sensory_elements` are required; a response missing
/// any of them is rejected and retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeAnalysis {
    /// Detailed location.
    pub setting: String,
    /// Dawn, dusk or night.
    #[serde(default)]
    pub time_of_day: Option<String>,
    /// Overall mood word.
    pub mood: String,
    /// Sensory channels to emphasise.
    pub sensory_elements: Vec<String>,
    /// Recurring objects.
    #[serde(default)]
    pub key_objects: Vec<String>,
    /// Atmosphere description.
    #[serde(default)]
    pub atmosphere: Option<String>,
    /// Ordered places along the journey.
    #[serde(default)]
    pub spatial_waypoints: Vec<String>,
}

impl ThemeAnalysis {
    /// Minimal analysis used when the model never returns valid JSON.
    pub fn fallback(theme: &str) -> Self {
        Self {
            setting: theme.to_string(),
            time_of_day: Some("dawn".to_string()),
            mood: default_mood(),
            sensory_elements: vec!["visual".to_string(), "audio".to_string()],
            key_objects: Vec::new(),
            atmosphere: Some("calm".to_string()),
            spatial_waypoints: Vec::new(),
        }
    }
}

/// One beat as planned by the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineBeat {
    /// Identifier assigned by the model.
    #[serde(default)]
    pub beat_id: Option<u32>,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// What happens in the beat.
    #[serde(default)]
    pub description: String,
    /// Suggested sensory focus words.
    #[serde(default)]
    pub sensory_focus: Vec<String>,
    /// Suggested waypoint.
    #[serde(default)]
    pub waypoint: Option<String>,
    /// Mood target on a 0–10 scale.
    #[serde(default)]
    pub mood_target: Option<f64>,
}

impl OutlineBeat {
    /// A generic beat continuing the journey.
    pub fn generic(number: usize) -> Self {
        Self {
            beat_id: u32::try_from(number).ok(),
            title: format!("Beat {}", number),
            description: "Continue the peaceful journey".to_string(),
            sensory_focus: vec!["sight".to_string(), "sound".to_string()],
            waypoint: None,
            mood_target: None,
        }
    }
}

/// One act of the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineAct {
    /// 1-based act number.
    #[serde(default)]
    pub act_number: u32,
    /// Act title.
    #[serde(default)]
    pub title: String,
    /// Beats in order.
    #[serde(default)]
    pub beats: Vec<OutlineBeat>,
}

/// Full story outline: bible plus acts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Permanent story facts.
    pub story_bible: StoryBible,
    /// Acts in order.
    pub acts: Vec<OutlineAct>,
}

impl Outline {
    /// Total number of beats across all acts.
    pub fn beat_count(&self) -> usize {
        self.acts.iter().map(|act| act.beats.len()).sum()
    }

    /// Iterate over beats in story order.
    pub fn beats(&self) -> impl Iterator<Item = &OutlineBeat> {
        self.acts.iter().flat_map(|act| act.beats.iter())
    }

    /// Keep at most `max` beats, dropping from the end.
    pub fn truncate_beats(&mut self, max: usize) {
        let mut remaining = max;
        for act in &mut self.acts {
            let keep = act.beats.len().min(remaining);
            act.beats.truncate(keep);
            remaining -= keep;
        }
        self.acts.retain(|act| !act.beats.is_empty());
    }

    /// One-line-per-beat human summary.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for act in &self.acts {
            lines.push(format!("Act {}: {}", act.act_number, act.title));
            for beat in &act.beats {
                if beat.description.is_empty() {
                    lines.push(format!("  - {}", beat.title));
                } else {
                    lines.push(format!("  - {}: {}", beat.title, beat.description));
                }
            }
        }
        lines.join("\n")
    }
}
