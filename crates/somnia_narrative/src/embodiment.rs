//! Per-beat embodiment scoring.

use crate::EmbodimentLexicon;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Minimum score for a beat to pass.
pub const EMBODIMENT_PASS_SCORE: u8 = 4;

/// Outcome of each embodiment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmbodimentChecks {
    /// A movement verb is present
    pub movement: bool,
    /// A spatial transition connector is present
    pub transition: bool,
    /// Both a corporeal and an environmental perception are present
    pub sensory_coupling: bool,
    /// A relaxation cue is present
    pub downshift: bool,
    /// The listener is addressed in the second person
    pub second_person: bool,
}

impl EmbodimentChecks {
    /// Names of the checks that failed.
    pub fn failed(&self) -> Vec<&'static str> {
        [
            ("movement", self.movement),
            ("transition", self.transition),
            ("sensory_coupling", self.sensory_coupling),
            ("downshift", self.downshift),
            ("second_person", self.second_person),
        ]
        .into_iter()
        .filter(|(_, passed)| !passed)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Embodiment score (0–5) for one beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbodimentReport {
    /// Number of passing checks
    pub score: u8,
    /// Whether the score reaches [`EMBODIMENT_PASS_SCORE`]
    pub ok: bool,
    /// Individual checks
    pub checks: EmbodimentChecks,
}

/// Scores beats for an embodied, second-person journey.
#[derive(Debug, Default)]
pub struct EmbodimentValidator {
    lexicon: EmbodimentLexicon,
}

impl EmbodimentValidator {
    /// Validator using the given lexicon.
    pub fn new(lexicon: EmbodimentLexicon) -> Self {
        Self { lexicon }
    }

    /// Score one beat.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub fn validate_beat(&self, text: &str) -> EmbodimentReport {
        let lowered = text.to_lowercase();
        let lex = &self.lexicon;
        let checks = EmbodimentChecks {
            movement: lex.movement.detect(&lowered),
            transition: lex.transition.detect(&lowered),
            sensory_coupling: lex.corporeal.detect(&lowered) && lex.environmental.detect(&lowered),
            downshift: lex.downshift.detect(&lowered),
            second_person: lex.second_person.detect(&lowered),
        };
        let score = [
            checks.movement,
            checks.transition,
            checks.sensory_coupling,
            checks.downshift,
            checks.second_person,
        ]
        .into_iter()
        .filter(|passed| *passed)
        .count() as u8;

        debug!(score, ?checks, "Embodiment scored");

        EmbodimentReport {
            score,
            ok: score >= EMBODIMENT_PASS_SCORE,
            checks,
        }
    }
}
