//! Tests for outline shapes parsed from model output

use somnia_core::{Outline, SensoryMode, StoryBible, ThemeAnalysis};
use std::str::FromStr;

#[test]
fn test_sparse_outline_deserializes_with_defaults() {
    let json = r#"{
        "story_bible": {"setting": "misty lake"},
        "acts": [
            {"act_number": 1, "title": "Arrival", "beats": [{"title": "Shore"}, {"title": "Jetty"}]},
            {"act_number": 2, "title": "Rest", "beats": [{"title": "Boathouse", "waypoint": "boathouse"}]}
        ]
    }"#;
    let outline: Outline = serde_json::from_str(json).unwrap();

    assert_eq!(outline.beat_count(), 3);
    assert_eq!(outline.story_bible.time_of_day, "dusk");
    assert_eq!(outline.story_bible.mood_baseline, 8.0);
    assert_eq!(outline.story_bible.destination, None);
    let titles: Vec<&str> = outline.beats().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Shore", "Jetty", "Boathouse"]);
}

#[test]
fn test_truncate_drops_from_the_end() {
    let json = r#"{
        "story_bible": {},
        "acts": [
            {"act_number": 1, "title": "One", "beats": [{"title": "a"}, {"title": "b"}]},
            {"act_number": 2, "title": "Two", "beats": [{"title": "c"}, {"title": "d"}]}
        ]
    }"#;
    let mut outline: Outline = serde_json::from_str(json).unwrap();
    outline.truncate_beats(2);

    assert_eq!(outline.beat_count(), 2);
    assert_eq!(outline.acts.len(), 1);
    assert!(outline.summary().starts_with("Act 1: One"));
}

#[test]
fn test_theme_analysis_requires_core_fields() {
    let missing_mood = r#"{"setting": "beach", "sensory_elements": ["audio"]}"#;
    assert!(serde_json::from_str::<ThemeAnalysis>(missing_mood).is_err());

    let fallback = ThemeAnalysis::fallback("quiet beach");
    assert_eq!(fallback.setting, "quiet beach");
    assert_eq!(fallback.mood, "peaceful");
}

#[test]
fn test_sensory_rotation_and_names() {
    let cycle: Vec<SensoryMode> = (0..5).map(SensoryMode::for_beat).collect();
    assert_eq!(cycle, SensoryMode::ROTATION.to_vec());
    assert_eq!(SensoryMode::for_beat(5), SensoryMode::Sight);
    assert_eq!(SensoryMode::from_str("smell").unwrap(), SensoryMode::Smell);
}

#[test]
fn test_bible_for_setting() {
    let bible = StoryBible::for_setting("alpine meadow");
    assert_eq!(bible.setting, "alpine meadow");
    assert!(bible.spatial_waypoints.is_empty());
}
