//! Tests for narrative memory and coherence scoring

use somnia_core::{OutlineBeat, StoryBible};
use somnia_narrative::{CONTEXT_WINDOW, CheckOutcome, NarrationLanguage, NarrativeMemory, jaccard};

const FIRST_BEAT: &str = "You walk into the pine forest with a lantern in your hand.";

fn forest_memory() -> NarrativeMemory {
    let bible = StoryBible {
        setting: "pine forest".to_string(),
        time_of_day: "dusk".to_string(),
        key_objects: vec!["lantern".to_string()],
        ..StoryBible::default()
    };
    let mut memory = NarrativeMemory::with_language(bible, NarrationLanguage::English);
    memory.add_beat_context(1, FIRST_BEAT, &OutlineBeat::generic(1));
    memory
}

#[test]
fn test_clean_beat_scores_ten() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence("Soft needles cover the ground and the air is calm.", 2);
    assert_eq!(report.score, 10.0);
    assert!(report.issues.is_empty());
    assert!(!report.needs_revision);
    assert_eq!(report.checks.get("repetition"), Some(&CheckOutcome::Clear));
}

#[test]
fn test_first_person_drift_is_penalized() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence("I walk slowly and my feet rest.", 2);
    assert_eq!(report.score, 8.5);
    assert!(report.issues[0].contains("first person"));
}

#[test]
fn test_time_of_day_conflict() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence("The morning sun rises over the pines.", 2);
    assert_eq!(report.score, 8.0);
    assert!(report.issues.iter().any(|i| i.starts_with("Time inconsistency")));
}

#[test]
fn test_italian_time_of_day_conflict() {
    let bible = StoryBible {
        setting: "bosco di pini".to_string(),
        time_of_day: "alba".to_string(),
        ..StoryBible::default()
    };
    let memory = NarrativeMemory::with_language(bible, NarrationLanguage::Italian);

    let report = memory.validate_beat_coherence("La luce della sera scende sul lago.", 1);
    assert_eq!(report.score, 8.0);
    assert_eq!(
        report.issues,
        vec!["Time inconsistency: story is set at alba but mentions sera".to_string()]
    );

    let calm = memory.validate_beat_coherence("L'aria serena dell'alba ti accompagna.", 1);
    assert_eq!(calm.score, 10.0);
}

#[test]
fn test_held_object_missing_from_bible() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence("You hold the brass compass close to you.", 2);
    assert_eq!(report.score, 8.0);
    assert_eq!(
        report.issues,
        vec!["Key object 'brass compass' is not in the story bible".to_string()]
    );
    assert!(matches!(report.checks.get("bible"), Some(CheckOutcome::Flagged(_))));
}

#[test]
fn test_each_unknown_object_costs_two_points() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence(
        "You carry the basket along and you cradle the kitten gently.",
        2,
    );
    assert_eq!(report.score, 6.0);
    assert!(report.needs_revision);
}

#[test]
fn test_bible_objects_and_body_are_not_flagged() {
    let memory = forest_memory();
    for text in [
        "You carry the lantern beneath the pines.",
        "You hold the old lantern and you hold your breath.",
    ] {
        let report = memory.validate_beat_coherence(text, 2);
        assert_eq!(report.score, 10.0, "{}: {:?}", text, report.issues);
    }
}

#[test]
fn test_italian_held_object_missing_from_bible() {
    let bible = StoryBible {
        setting: "bosco".to_string(),
        time_of_day: "notte".to_string(),
        key_objects: vec!["lanterna".to_string()],
        ..StoryBible::default()
    };
    let memory = NarrativeMemory::with_language(bible, NarrationLanguage::Italian);

    let flagged = memory.validate_beat_coherence("Stringi la bussola tra le mani.", 1);
    assert_eq!(flagged.score, 8.0);
    let kept = memory.validate_beat_coherence("Tieni la lanterna e stringi le mani.", 1);
    assert_eq!(kept.score, 10.0, "{:?}", kept.issues);
}

#[test]
fn test_unintroduced_location_is_flagged() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence("You reach a quiet beach.", 2);
    assert_eq!(report.score, 9.0);
    assert_eq!(
        report.issues,
        vec!["Location 'beach' introduced without context".to_string()]
    );
}

#[test]
fn test_jarring_words_only_warn() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence("Suddenly an owl calls.", 2);
    assert_eq!(report.score, 9.5);
    assert!(report.issues.is_empty());
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn test_near_copy_needs_revision_with_suggestions() {
    let memory = forest_memory();
    let draft = "I walk into the pine forest with a lantern in my hand.";
    let report = memory.validate_beat_coherence(draft, 2);

    assert_eq!(report.score, 5.5);
    assert!(report.needs_revision);
    assert!(!report.severe);

    let suggestion = memory.suggest_beat_improvements(draft, &report).unwrap();
    assert!(suggestion.contains("use different words and phrases"));
    assert!(suggestion.contains("keep the second-person perspective"));
    assert!(suggestion.ends_with(draft));
}

#[test]
fn test_no_suggestion_for_coherent_beat() {
    let memory = forest_memory();
    let report = memory.validate_beat_coherence("Soft needles cover the ground.", 2);
    assert!(memory.suggest_beat_improvements("Soft needles cover the ground.", &report).is_none());
}

#[test]
fn test_first_beat_skips_history_checks() {
    let memory = NarrativeMemory::new(StoryBible::for_setting("lake"));
    let report = memory.validate_beat_coherence("Il lago riposa.", 1);
    assert!(matches!(report.checks.get("repetition"), Some(CheckOutcome::Skipped(_))));
    assert!(matches!(report.checks.get("mood"), Some(CheckOutcome::Skipped(_))));
    assert_eq!(report.score, 10.0);
}

#[test]
fn test_context_window_is_bounded() {
    let mut memory = forest_memory();
    for id in 2..=6 {
        memory.add_beat_context(id, &format!("Beat number {} passes quietly.", id), &OutlineBeat::generic(id));
    }
    assert_eq!(memory.stats().context_beats, CONTEXT_WINDOW);
    assert_eq!(memory.previous_text(3), "6 passes quietly.");
}

#[test]
fn test_prompt_additions_carry_continuity() {
    let memory = forest_memory();
    let additions = memory.get_coherence_prompt_additions();
    assert!(additions.contains("CHARACTERS ESTABLISHED: you"));
    assert!(additions.contains("CURRENT SETTING: forest"));
    assert!(additions.contains("OBJECTS IN SCENE: lantern"));
    assert!(additions.contains("MOOD BASELINE: 8.0/10"));
}

#[test]
fn test_repeated_phrases_are_collected() {
    let mut memory = forest_memory();
    memory.add_beat_context(2, "Again you walk into the pine woods.", &OutlineBeat::generic(2));
    assert!(
        memory
            .forbidden_repetitions()
            .contains(&"you walk into".to_string())
    );
}

#[test]
fn test_jaccard_overlap() {
    assert_eq!(jaccard("a b", "b c"), 1.0 / 3.0);
    assert_eq!(jaccard("Same Words", "same words"), 1.0);
}
