//! Story bible: the permanent facts of one story.

use serde::{Deserialize, Serialize};

fn default_time_of_day() -> String {
    "dusk".to_string()
}

fn default_mood_baseline() -> f64 {
    8.0
}

/// Permanent story elements produced once by outline generation.
///
/// Read-only for the rest of a run. Every field has a serde default so that
/// partially formed model output still deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBible {
    /// Where the story takes place.
    #[serde(default)]
    pub setting: String,
    /// Dawn, dusk, night...
    #[serde(default = "default_time_of_day")]
    pub time_of_day: String,
    /// Calmness baseline on a 0–10 scale.
    #[serde(default = "default_mood_baseline")]
    pub mood_baseline: f64,
    /// Objects that recur through the story.
    #[serde(default)]
    pub key_objects: Vec<String>,
    /// Ordered places the listener passes through.
    #[serde(default)]
    pub spatial_waypoints: Vec<String>,
    /// The restful place promised at the start and reached at the end.
    #[serde(default)]
    pub destination: Option<String>,
}

impl StoryBible {
    /// Minimal bible for a setting with defaults everywhere else.
    pub fn for_setting(setting: impl Into<String>) -> Self {
        Self {
            setting: setting.into(),
            ..Self::default()
        }
    }
}

impl Default for StoryBible {
    fn default() -> Self {
        Self {
            setting: String::new(),
            time_of_day: default_time_of_day(),
            mood_baseline: default_mood_baseline(),
            key_objects: Vec::new(),
            spatial_waypoints: Vec::new(),
            destination: None,
        }
    }
}
