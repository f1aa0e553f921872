//! Destination arc: choosing the promised place, phasing beats toward it and
//! checking that the finished story delivers it.

use crate::{DestinationConfig, DestinationLexicon};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Phase of the arc a validator can find missing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArcPhase {
    /// Destination promised in the opening beats
    DestinationSetup,
    /// Progress toward it in the middle beats
    JourneyProgress,
    /// Arrival in the closing beats
    ArrivalClosure,
}

/// Result of checking a beat sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationReport {
    /// All phases present
    pub ok: bool,
    /// Missing phases, in arc order
    pub missing: Vec<ArcPhase>,
}

/// Beats at the start in which the promise must appear.
const SETUP_WINDOW: usize = 2;
/// Beats at the end in which arrival must appear.
const ARRIVAL_WINDOW: usize = 3;
/// Beats excluded from each end when looking for progress.
const PROGRESS_MARGIN: usize = 2;

/// Checks the destination arc across a whole story.
#[derive(Debug, Default)]
pub struct DestinationValidator {
    lexicon: DestinationLexicon,
}

impl DestinationValidator {
    /// Validator using the given lexicon.
    pub fn new(lexicon: DestinationLexicon) -> Self {
        Self { lexicon }
    }

    /// Whether the text promises tonight's destination.
    pub fn detect_promise(&self, text: &str) -> bool {
        self.lexicon.promise.detect(&text.to_lowercase())
    }

    /// Whether the text marks progress toward the destination.
    pub fn detect_progress(&self, text: &str) -> bool {
        self.lexicon.progress.detect(&text.to_lowercase())
    }

    /// Whether the text describes arriving.
    pub fn detect_arrival(&self, text: &str) -> bool {
        self.lexicon.arrival.detect(&text.to_lowercase())
    }

    /// Check the three arc phases over beat texts in story order.
    ///
    /// Sequences shorter than five beats have no middle section, so the
    /// progress phase is counted as present for them.
    #[instrument(skip(self, beats), fields(beats = beats.len()))]
    pub fn validate_destination_arc<S: AsRef<str>>(&self, beats: &[S]) -> DestinationReport {
        let n = beats.len();
        let has_setup = beats
            .iter()
            .take(SETUP_WINDOW)
            .any(|b| self.detect_promise(b.as_ref()));
        let has_progress = if n > 2 * PROGRESS_MARGIN {
            beats[PROGRESS_MARGIN..n - PROGRESS_MARGIN]
                .iter()
                .any(|b| self.detect_progress(b.as_ref()))
        } else {
            true
        };
        let has_arrival = beats
            .iter()
            .skip(n.saturating_sub(ARRIVAL_WINDOW))
            .any(|b| self.detect_arrival(b.as_ref()));

        let missing: Vec<ArcPhase> = [
            (ArcPhase::DestinationSetup, has_setup),
            (ArcPhase::JourneyProgress, has_progress),
            (ArcPhase::ArrivalClosure, has_arrival),
        ]
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(phase, _)| phase)
        .collect();

        debug!(?missing, "Destination arc checked");

        DestinationReport {
            ok: missing.is_empty(),
            missing,
        }
    }
}

/// Beat responsible for a missing phase.
///
/// Setup maps to the first beat, progress to the middle beat and arrival to
/// the last beat.
pub fn beat_for_phase(phase: ArcPhase, beat_count: usize) -> Option<usize> {
    if beat_count == 0 {
        return None;
    }
    Some(match phase {
        ArcPhase::DestinationSetup => 0,
        ArcPhase::JourneyProgress => beat_count / 2,
        ArcPhase::ArrivalClosure => beat_count - 1,
    })
}

/// Families of restful destinations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DestinationArchetype {
    /// Enclosed, protected places
    SafeShelter,
    /// Open places with a view
    PeacefulVista,
    /// Places by still or slow water
    RestorativeWater,
    /// Quiet places of ritual
    SacredSpace,
}

impl DestinationArchetype {
    /// Places belonging to the archetype.
    pub fn places(&self) -> &'static [&'static str] {
        match self {
            DestinationArchetype::SafeShelter => &["cottage", "cabin", "sanctuary", "grove"],
            DestinationArchetype::PeacefulVista => &["meadow", "clearing", "overlook", "garden"],
            DestinationArchetype::RestorativeWater => &["pool", "stream", "cove", "spring"],
            DestinationArchetype::SacredSpace => &["temple", "circle", "altar", "threshold"],
        }
    }

    fn theme_hints(&self) -> &'static [&'static str] {
        match self {
            DestinationArchetype::SafeShelter => &["forest", "wood", "mountain", "snow", "winter"],
            DestinationArchetype::PeacefulVista => &["hill", "field", "valley", "countryside"],
            DestinationArchetype::RestorativeWater => {
                &["lake", "sea", "ocean", "beach", "river", "rain"]
            }
            DestinationArchetype::SacredSpace => &["monastery", "ancient", "stars", "moon"],
        }
    }

    const ALL: [DestinationArchetype; 4] = [
        DestinationArchetype::SafeShelter,
        DestinationArchetype::PeacefulVista,
        DestinationArchetype::RestorativeWater,
        DestinationArchetype::SacredSpace,
    ];
}

/// Pick the promised destination for a story.
///
/// A place named outright in the theme or setting wins; otherwise the first
/// archetype whose hints match supplies its first place; otherwise a cottage.
///
/// # Examples
///
/// ```
/// use somnia_narrative::select_destination;
///
/// assert_eq!(select_destination("a walk to the old temple", ""), "temple");
/// assert_eq!(select_destination("tranquil forest", "pine forest at dusk"), "cottage");
/// assert_eq!(select_destination("quiet lake", ""), "pool");
/// ```
pub fn select_destination(theme: &str, setting: &str) -> String {
    let haystack = format!("{} {}", theme, setting).to_lowercase();

    for archetype in DestinationArchetype::ALL {
        if let Some(place) = archetype.places().iter().find(|p| haystack.contains(*p)) {
            return (*place).to_string();
        }
    }
    for archetype in DestinationArchetype::ALL {
        if archetype.theme_hints().iter().any(|h| haystack.contains(*h)) {
            return archetype.places()[0].to_string();
        }
    }
    DestinationArchetype::SafeShelter.places()[0].to_string()
}

/// Where a beat sits on the journey to the destination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DestinationPhase {
    /// Setting out; the destination is promised
    Departure,
    /// On the way
    Journey,
    /// The destination comes into reach
    Approach,
    /// Arriving and settling
    Arrival,
}

impl DestinationPhase {
    /// Phase of the 0-based beat `index` in a story of `total` beats.
    ///
    /// # Examples
    ///
    /// ```
    /// use somnia_narrative::{DestinationConfig, DestinationPhase};
    ///
    /// let config = DestinationConfig::default();
    /// assert_eq!(DestinationPhase::for_beat(0, 12, &config), DestinationPhase::Departure);
    /// assert_eq!(DestinationPhase::for_beat(4, 12, &config), DestinationPhase::Journey);
    /// assert_eq!(DestinationPhase::for_beat(8, 12, &config), DestinationPhase::Approach);
    /// assert_eq!(DestinationPhase::for_beat(11, 12, &config), DestinationPhase::Arrival);
    /// ```
    pub fn for_beat(index: usize, total: usize, config: &DestinationConfig) -> Self {
        let total = total.max(1);
        if index < config.promise_beats {
            DestinationPhase::Departure
        } else if index + config.settlement_beats >= total {
            DestinationPhase::Arrival
        } else if (index + 1) as f64 / total as f64 >= config.arrival_signals_start {
            DestinationPhase::Approach
        } else {
            DestinationPhase::Journey
        }
    }

    /// Prompt guidance for writing a beat in this phase.
    pub fn instructions(&self, destination: &str) -> String {
        match self {
            DestinationPhase::Departure => format!(
                "Promise tonight's destination, the {}, and set out toward it",
                destination
            ),
            DestinationPhase::Journey => format!(
                "Move steadily toward the {}; mark that it is drawing closer",
                destination
            ),
            DestinationPhase::Approach => format!(
                "The {} comes into view; slow the pace as you draw near",
                destination
            ),
            DestinationPhase::Arrival => format!(
                "Arrive at the {}, settle in, and invite rest",
                destination
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_beat_checks_setup_and_arrival_together() {
        let validator = DestinationValidator::default();
        let report =
            validator.validate_destination_arc(&["Stanotte cammini verso il rifugio e arrivi."]);
        assert!(report.ok);
    }

    #[test]
    fn test_phase_for_beat_in_four_beat_story() {
        let config = DestinationConfig::default();
        let phases: Vec<_> = (0..4)
            .map(|i| DestinationPhase::for_beat(i, 4, &config))
            .collect();
        assert_eq!(
            phases,
            vec![
                DestinationPhase::Departure,
                DestinationPhase::Journey,
                DestinationPhase::Arrival,
                DestinationPhase::Arrival
            ]
        );
    }
}
