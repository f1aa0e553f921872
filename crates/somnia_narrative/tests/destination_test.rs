//! Tests for the destination arc

use somnia_narrative::{
    ArcPhase, DestinationLexicon, DestinationValidator, beat_for_phase, select_destination,
};

fn english() -> DestinationValidator {
    DestinationValidator::new(DestinationLexicon::english())
}

fn six_beats(arrival: &str) -> Vec<String> {
    vec![
        "Tonight you set out toward the cottage by the lake.".to_string(),
        "The trees stand tall and still.".to_string(),
        "Moss covers the old stones.".to_string(),
        "The cottage draws near between the pines.".to_string(),
        "A lantern glows in a window.".to_string(),
        arrival.to_string(),
    ]
}

#[test]
fn test_complete_arc_passes() {
    let beats = six_beats("At last you arrive and settle by the fire.");
    let report = english().validate_destination_arc(&beats);
    assert!(report.ok);
    assert!(report.missing.is_empty());
}

#[test]
fn test_missing_arrival_is_reported() {
    let beats = six_beats("The fire crackles softly.");
    let report = english().validate_destination_arc(&beats);
    assert!(!report.ok);
    assert_eq!(report.missing, vec![ArcPhase::ArrivalClosure]);
    let names: Vec<String> = report.missing.iter().map(|p| p.to_string()).collect();
    assert_eq!(names, vec!["arrival_closure"]);
}

#[test]
fn test_promise_needs_time_and_goal() {
    let validator = english();
    assert!(validator.detect_promise("Tonight you walk toward the meadow."));
    assert!(!validator.detect_promise("Tonight the wind is soft."));
    assert!(!validator.detect_promise("You walk toward the meadow."));
}

#[test]
fn test_promise_outside_opening_beats_does_not_count() {
    let mut beats = six_beats("At last you arrive and settle by the fire.");
    beats[0] = "The evening is quiet.".to_string();
    beats[2] = "Tonight you set out toward the cottage.".to_string();
    let report = english().validate_destination_arc(&beats);
    assert_eq!(report.missing, vec![ArcPhase::DestinationSetup]);
}

#[test]
fn test_progress_only_checked_in_middle() {
    let beats = vec![
        "Tonight you head toward the grove.",
        "The path is soft.",
        "Owls call.",
        "Ferns brush your legs.",
        "The grove draws near.",
        "You arrive at the grove.",
    ];
    let report = english().validate_destination_arc(&beats);
    assert_eq!(report.missing, vec![ArcPhase::JourneyProgress]);
}

#[test]
fn test_short_stories_skip_progress() {
    let beats = ["Tonight you walk toward the pool.", "You arrive at the pool."];
    assert!(english().validate_destination_arc(&beats).ok);
}

#[test]
fn test_phase_owners() {
    assert_eq!(beat_for_phase(ArcPhase::DestinationSetup, 6), Some(0));
    assert_eq!(beat_for_phase(ArcPhase::JourneyProgress, 6), Some(3));
    assert_eq!(beat_for_phase(ArcPhase::ArrivalClosure, 6), Some(5));
    assert_eq!(beat_for_phase(ArcPhase::ArrivalClosure, 0), None);
}

#[test]
fn test_destination_selection() {
    assert_eq!(select_destination("sunset meadow", ""), "meadow");
    assert_eq!(select_destination("rain on the river", ""), "pool");
    assert_eq!(select_destination("something else entirely", ""), "cottage");
}
