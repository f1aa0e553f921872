//! Per-beat word budgets and deterministic opener variation.

use tracing::{debug, instrument};

/// Openers the models overuse at the start of a beat.
pub const OPENER_DENYLIST: [&str; 5] = ["As you ", "You breathe", "You take", "As your", "You step"];

/// Ambient-first openers used in place of a denylisted one.
pub const GENTLE_OPENERS: [&str; 5] = [
    "The air carries ",
    "From the distance, ",
    "Around you, ",
    "Along the path, ",
    "In the hush, ",
];

const MIN_BEATS: usize = 1;
const MIN_TOTAL_WORDS: usize = 200;

/// Splits a story's word budget into tapered per-beat targets.
///
/// Early beats get up to 15% more than an even share and late beats up to
/// 15% less; the targets always sum exactly to the (clamped) total.
///
/// # Examples
///
/// ```
/// use somnia_narrative::WordBudgetScheduler;
///
/// let scheduler = WordBudgetScheduler::new(4, 1400);
/// assert_eq!(scheduler.targets().iter().sum::<usize>(), 1400);
/// assert!(scheduler.target_for(1) >= scheduler.target_for(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBudgetScheduler {
    targets: Vec<usize>,
    total_words: usize,
}

impl WordBudgetScheduler {
    /// Build targets for `beats` beats totalling `total_words`.
    ///
    /// At least one beat and 200 words are always scheduled.
    #[instrument(level = "debug")]
    pub fn new(beats: usize, total_words: usize) -> Self {
        let beats = beats.max(MIN_BEATS);
        let total_words = total_words.max(MIN_TOTAL_WORDS);
        let targets = distribute(beats, total_words);
        debug!(beats, total_words, ?targets, "Scheduled beat targets");
        Self {
            targets,
            total_words,
        }
    }

    /// Targets in beat order.
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Number of scheduled beats.
    pub fn beat_count(&self) -> usize {
        self.targets.len()
    }

    /// Total scheduled words.
    pub fn total_words(&self) -> usize {
        self.total_words
    }

    /// Target for a 1-based beat number, clamped into range.
    pub fn target_for(&self, beat_number: usize) -> usize {
        let index = beat_number.saturating_sub(1).min(self.targets.len() - 1);
        self.targets[index]
    }

    /// Replace a denylisted opening prefix with the first gentle opener.
    ///
    /// Only the matched prefix is replaced; the rest of the text is kept.
    pub fn vary_openers(&self, text: &str) -> String {
        vary_opener(text)
    }
}

/// Free-function form of [`WordBudgetScheduler::vary_openers`].
pub fn vary_opener(text: &str) -> String {
    for bad in OPENER_DENYLIST {
        if let Some(rest) = text.strip_prefix(bad) {
            return format!("{}{}", GENTLE_OPENERS[0], rest);
        }
    }
    text.to_string()
}

fn distribute(beats: usize, total_words: usize) -> Vec<usize> {
    let base = (total_words / beats) as f64;
    let mut targets: Vec<usize> = (0..beats)
        .map(|i| {
            let multiplier = if beats == 1 {
                1.0
            } else {
                1.15 - 0.30 * i as f64 / (beats - 1) as f64
            };
            (base * multiplier).floor() as usize
        })
        .collect();

    let sum: usize = targets.iter().sum();
    if sum < total_words {
        let mut remaining = total_words - sum;
        let mut index = 0;
        while remaining > 0 {
            targets[index % beats] += 1;
            remaining -= 1;
            index += 1;
        }
    } else if sum > total_words {
        let mut excess = sum - total_words;
        let mut index = 0;
        while excess > 0 {
            let slot = &mut targets[index % beats];
            if *slot > 0 {
                *slot -= 1;
                excess -= 1;
            }
            index += 1;
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_budget_sums_exactly() {
        let targets = distribute(3, 3);
        assert_eq!(targets.iter().sum::<usize>(), 3);
    }
}
