//! Tests for per-beat word budgets and opener variation

use somnia_narrative::{GENTLE_OPENERS, WordBudgetScheduler, vary_opener};

#[test]
fn test_targets_sum_to_total() {
    for beats in 1..=16 {
        for total in [200, 777, 1400, 4200, 8401] {
            let scheduler = WordBudgetScheduler::new(beats, total);
            assert_eq!(scheduler.beat_count(), beats);
            assert_eq!(
                scheduler.targets().iter().sum::<usize>(),
                total,
                "beats={} total={}",
                beats,
                total
            );
        }
    }
}

#[test]
fn test_small_totals_are_clamped() {
    let scheduler = WordBudgetScheduler::new(4, 50);
    assert_eq!(scheduler.total_words(), 200);
    assert_eq!(scheduler.targets().iter().sum::<usize>(), 200);
}

#[test]
fn test_zero_beats_schedules_one() {
    let scheduler = WordBudgetScheduler::new(0, 1000);
    assert_eq!(scheduler.targets(), &[1000]);
}

#[test]
fn test_targets_taper_toward_the_end() {
    let scheduler = WordBudgetScheduler::new(12, 8400);
    let targets = scheduler.targets();
    assert!(targets[0] > targets[11]);
    for pair in targets.windows(2) {
        assert!(pair[0] >= pair[1], "{:?}", targets);
    }
    // Even share is 700; the ends sit near ±15%.
    assert!((800..=806).contains(&targets[0]), "{}", targets[0]);
    assert!((593..=597).contains(&targets[11]), "{}", targets[11]);
}

#[test]
fn test_target_for_clamps_beat_number() {
    let scheduler = WordBudgetScheduler::new(3, 900);
    assert_eq!(scheduler.target_for(0), scheduler.target_for(1));
    assert_eq!(scheduler.target_for(99), scheduler.target_for(3));
}

#[test]
fn test_denylisted_opener_is_replaced() {
    assert_eq!(
        vary_opener("As you walk along the shore."),
        format!("{}walk along the shore.", GENTLE_OPENERS[0])
    );
    assert_eq!(
        vary_opener("You breathe slowly."),
        format!("{} slowly.", GENTLE_OPENERS[0])
    );
}

#[test]
fn test_other_openers_are_untouched() {
    let text = "The lantern glows softly on the table.";
    assert_eq!(vary_opener(text), text);
    let scheduler = WordBudgetScheduler::new(2, 400);
    assert_eq!(scheduler.vary_openers(text), text);
}
