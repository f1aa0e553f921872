//! Heuristic critique run before the reasoner stage.
//!
//! The critic is cheap and deterministic: it looks for an opener the run
//! keeps reusing, a missing connective near the start of the beat and an
//! overload of sensory words. Each finding becomes a hint for the reasoner.

use crate::NarrationLanguage;
use somnia_core::word_count;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Words that make up an opener for the critique.
const OPENER_WORDS: usize = 4;
/// Words at the start of a beat searched for a connective.
const CONNECTIVE_WINDOW: usize = 30;

/// Connectives and sensory stems for one narration language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CritiqueLexicon {
    connectives: &'static [&'static str],
    sensory_stems: &'static [&'static str],
}

impl CritiqueLexicon {
    /// Italian word lists.
    pub fn italian() -> Self {
        Self {
            connectives: &[
                "poi",
                "mentre",
                "intanto",
                "così",
                "quando",
                "allora",
                "ora",
                "lentamente",
                "più avanti",
                "oltre",
            ],
            sensory_stems: &[
                "luce", "luci", "suon", "profum", "odor", "frusci", "brezz", "calor", "fresc",
                "morbid", "sussurr", "color", "ombr", "tiepid",
            ],
        }
    }

    /// English word lists.
    pub fn english() -> Self {
        Self {
            connectives: &[
                "then",
                "as",
                "while",
                "meanwhile",
                "now",
                "slowly",
                "beyond",
                "so",
                "until",
                "further along",
            ],
            sensory_stems: &[
                "light", "sound", "scent", "smell", "rustl", "breez", "warm", "cool", "soft",
                "whisper", "colo", "shadow", "glow", "fragran",
            ],
        }
    }

    /// Lists for a narration language.
    pub fn for_language(language: NarrationLanguage) -> Self {
        match language {
            NarrationLanguage::Italian => Self::italian(),
            NarrationLanguage::English => Self::english(),
        }
    }
}

impl Default for CritiqueLexicon {
    fn default() -> Self {
        Self::italian()
    }
}

/// Findings for one draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Critique {
    /// Hints for the reasoner, empty when the draft looks fine
    pub hints: Vec<String>,
    /// Opener of the draft, lowercased
    pub opener: String,
    /// Times this opener has been seen in the run
    pub opener_count: usize,
    /// Sensory words per word
    pub sensory_density: f64,
}

/// Stateful critic; opener counts persist across the beats of a run.
#[derive(Debug, Clone)]
pub struct HeuristicCritic {
    lexicon: CritiqueLexicon,
    opener_threshold: usize,
    density_threshold: f64,
    opener_counts: HashMap<String, usize>,
    dynamic_denylist: Vec<String>,
}

impl HeuristicCritic {
    /// Critic flagging openers seen `opener_threshold` times and sensory
    /// density above `density_threshold`.
    pub fn new(lexicon: CritiqueLexicon, opener_threshold: usize, density_threshold: f64) -> Self {
        Self {
            lexicon,
            opener_threshold: opener_threshold.max(1),
            density_threshold,
            opener_counts: HashMap::new(),
            dynamic_denylist: Vec::new(),
        }
    }

    /// Openers the critic has flagged during the run, in flag order.
    pub fn dynamic_denylist(&self) -> &[String] {
        &self.dynamic_denylist
    }

    /// Critique a draft and update the opener counts.
    #[instrument(skip(self, text), fields(words = word_count(text)))]
    pub fn critique(&mut self, text: &str) -> Critique {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let mut hints = Vec::new();

        let opener = tokens
            .iter()
            .take(OPENER_WORDS)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let opener_count = if opener.is_empty() {
            0
        } else {
            let count = self.opener_counts.entry(opener.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if opener_count >= self.opener_threshold {
            hints.push(format!(
                "The opening \"{}\" has been used {} times; begin differently",
                opener, opener_count
            ));
            if !self.dynamic_denylist.contains(&opener) {
                debug!(opener = %opener, "Opener added to dynamic denylist");
                self.dynamic_denylist.push(opener.clone());
            }
        }

        let head = format!(
            " {} ",
            tokens
                .iter()
                .take(CONNECTIVE_WINDOW)
                .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
                .collect::<Vec<_>>()
                .join(" ")
        );
        let has_connective = self
            .lexicon
            .connectives
            .iter()
            .any(|c| head.contains(&format!(" {} ", c)));
        if !tokens.is_empty() && !has_connective {
            hints.push(
                "Link the opening sentences with a gentle connective so the movement flows"
                    .to_string(),
            );
        }

        let sensory = tokens
            .iter()
            .filter(|t| self.lexicon.sensory_stems.iter().any(|s| t.contains(*s)))
            .count();
        let sensory_density = sensory as f64 / tokens.len().max(1) as f64;
        if sensory_density > self.density_threshold {
            hints.push(format!(
                "Sensory detail is dense ({:.0}% of words); let a few images breathe",
                sensory_density * 100.0
            ));
        }

        debug!(
            opener_count,
            sensory_density,
            hints = hints.len(),
            "Draft critiqued"
        );

        Critique {
            hints,
            opener,
            opener_count,
            sensory_density,
        }
    }
}
