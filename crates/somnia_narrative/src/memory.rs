//! Cross-beat narrative memory and coherence scoring.
//!
//! Memory keeps a short window of accepted beats, tracks the entities they
//! mention and samples mood and style so that each new prompt can carry
//! continuity reminders. It also scores drafts for coherence with what came
//! before.

use crate::NarrationLanguage;
use serde::{Deserialize, Serialize};
use somnia_core::{OutlineBeat, StoryBible, word_count};
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, instrument};

/// Beats kept in the context window.
pub const CONTEXT_WINDOW: usize = 4;
const MOOD_WINDOW: usize = 5;
const STYLE_WINDOW: usize = 3;
const KEY_PHRASE_CAP: usize = 500;
const KEY_PHRASE_KEEP: usize = 400;
const DEFAULT_MOOD: f64 = 8.0;

const LOCATION_VOCABULARY: [&str; 12] = [
    "forest", "beach", "mountain", "garden", "lake", "river", "meadow", "valley", "hill", "path",
    "cave", "cottage",
];
const CHARACTER_WORDS: [&str; 2] = ["you", "your"];
const POSITIVE_WORDS: [&str; 7] = [
    "peaceful",
    "calm",
    "gentle",
    "warm",
    "soft",
    "beautiful",
    "serene",
];
const NEGATIVE_WORDS: [&str; 6] = ["harsh", "cold", "rough", "loud", "sharp", "bitter"];
const DESCRIPTIVE_WORDS: [&str; 5] = ["gently", "slowly", "softly", "quietly", "peacefully"];
const STRESS_WORDS: [&str; 5] = ["suddenly", "shocking", "loud", "fast", "quickly"];
const FIRST_PERSON_ENGLISH: &[&str] = &["i", "me", "my", "mine", "myself"];
const FIRST_PERSON_ITALIAN: &[&str] = &["io", "mio", "mia", "miei", "mie"];

/// Bible time words and the times that contradict them, English and Italian.
const TIME_CONFLICTS: [(&[&str], &[&str]); 3] = [
    (
        &["dawn", "sunrise", "alba", "aurora"],
        &[
            "midnight", "evening", "dusk", "mezzanotte", "sera", "crepuscolo", "tramonto",
        ],
    ),
    (
        &["dusk", "sunset", "evening", "crepuscolo", "tramonto", "sera"],
        &[
            "morning", "dawn", "noon", "mattina", "mattino", "alba", "mezzogiorno",
        ],
    ),
    (
        &["night", "midnight", "notte", "mezzanotte"],
        &[
            "morning", "noon", "daylight", "mattina", "mattino", "mezzogiorno",
        ],
    ),
];
/// Second-person verbs that put an object in the listener's hands.
const HOLDING_VERBS: [&str; 9] = [
    "carry", "hold", "clutch", "grip", "cradle", "tieni", "stringi", "reggi", "impugni",
];
/// Definite articles and possessives introducing a held object.
const OBJECT_DETERMINERS: [&str; 14] = [
    "the", "your", "il", "lo", "la", "l", "i", "gli", "le", "tuo", "tua", "tuoi", "tue", "same",
];
/// Things held that are never objects.
const BODY_WORDS: [&str; 15] = [
    "breath", "hand", "hands", "arms", "knees", "head", "shoulders", "eyes", "respiro", "fiato",
    "mano", "mani", "braccia", "spalle", "occhi",
];
/// Words after the determiner read as the object's name.
const OBJECT_WORDS: usize = 2;

const OVERLAP_LIMIT: f64 = 0.4;
const OVERLAP_PENALTY: f64 = 3.0;
const CHARACTER_PENALTY: f64 = 1.5;
const LOCATION_PENALTY: f64 = 1.0;
const MOOD_PENALTY: f64 = 0.5;
const BIBLE_PENALTY: f64 = 2.0;
const REVISION_THRESHOLD: f64 = 7.0;
const SEVERE_THRESHOLD: f64 = 5.0;

/// What memory knows about one character, location or object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityTracker {
    /// Mentioned at least once (or seeded from the bible)
    pub introduced: bool,
    /// Last beat id that mentioned it (0 = never)
    pub last_mentioned: usize,
    /// Optional description for prompt reminders
    pub description: Option<String>,
    /// Part of the current scene
    pub currently_active: bool,
}

/// Style measurements of one beat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleSample {
    /// Mean words per sentence
    pub average_sentence_length: f64,
    /// Descriptive adverbs per word
    pub descriptive_density: f64,
    /// Blank-line separated paragraphs
    pub paragraph_count: usize,
}

/// Result of one coherence sub-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckOutcome {
    /// Nothing found
    Clear,
    /// Problems found
    Flagged(Vec<String>),
    /// Check could not run; contributes nothing to the score
    Skipped(String),
}

impl CheckOutcome {
    fn from_findings(findings: Vec<String>) -> Self {
        if findings.is_empty() {
            CheckOutcome::Clear
        } else {
            CheckOutcome::Flagged(findings)
        }
    }

    fn findings(&self) -> &[String] {
        match self {
            CheckOutcome::Flagged(findings) => findings,
            _ => &[],
        }
    }
}

/// Coherence score for a draft beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceReport {
    /// 0–10, starting from 10
    pub score: f64,
    /// Problems that cost points
    pub issues: Vec<String>,
    /// Softer concerns
    pub warnings: Vec<String>,
    /// Score below 7
    pub needs_revision: bool,
    /// Score below 5
    pub severe: bool,
    /// Outcome of each sub-check, by name
    pub checks: BTreeMap<String, CheckOutcome>,
}

/// Sizes of the memory's trackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Beats in the context window
    pub context_beats: usize,
    /// Characters tracked
    pub tracked_characters: usize,
    /// Locations tracked
    pub tracked_locations: usize,
    /// Objects tracked
    pub tracked_objects: usize,
    /// Distinct phrases remembered
    pub key_phrases: usize,
    /// Phrases seen more than once
    pub forbidden_repetitions: usize,
}

#[derive(Debug, Clone)]
struct WindowEntry {
    beat_id: usize,
    text: String,
}

/// Narrative state for one run.
///
/// The context window never holds more than [`CONTEXT_WINDOW`] beats.
#[derive(Debug, Clone)]
pub struct NarrativeMemory {
    bible: StoryBible,
    first_person: &'static [&'static str],
    window: VecDeque<WindowEntry>,
    characters: BTreeMap<String, EntityTracker>,
    locations: BTreeMap<String, EntityTracker>,
    objects: BTreeMap<String, EntityTracker>,
    mood_samples: VecDeque<f64>,
    style_samples: VecDeque<StyleSample>,
    key_phrase_order: VecDeque<String>,
    key_phrases: HashSet<String>,
    forbidden_repetitions: Vec<String>,
    overlaps: Vec<f64>,
}

impl NarrativeMemory {
    /// Memory seeded from the story bible.
    ///
    /// Key objects become object trackers; vocabulary locations named in the
    /// setting start out introduced and active.
    pub fn new(bible: StoryBible) -> Self {
        Self::with_language(bible, NarrationLanguage::default())
    }

    /// Memory for a story narrated in `language`.
    #[instrument(skip(bible), fields(setting = %bible.setting))]
    pub fn with_language(bible: StoryBible, language: NarrationLanguage) -> Self {
        let mut objects = BTreeMap::new();
        for object in &bible.key_objects {
            let name = object.trim().to_lowercase();
            if name.len() > 1 {
                objects.insert(name, EntityTracker::default());
            }
        }

        let setting = bible.setting.to_lowercase();
        let mut locations = BTreeMap::new();
        for word in LOCATION_VOCABULARY {
            if setting.contains(word) {
                locations.insert(
                    word.to_string(),
                    EntityTracker {
                        introduced: true,
                        last_mentioned: 0,
                        description: None,
                        currently_active: true,
                    },
                );
            }
        }

        debug!(
            objects = objects.len(),
            locations = locations.len(),
            "Narrative memory initialized"
        );

        let first_person = match language {
            NarrationLanguage::Italian => FIRST_PERSON_ITALIAN,
            NarrationLanguage::English => FIRST_PERSON_ENGLISH,
        };

        Self {
            bible,
            first_person,
            window: VecDeque::with_capacity(CONTEXT_WINDOW),
            characters: BTreeMap::new(),
            locations,
            objects,
            mood_samples: VecDeque::with_capacity(MOOD_WINDOW),
            style_samples: VecDeque::with_capacity(STYLE_WINDOW),
            key_phrase_order: VecDeque::new(),
            key_phrases: HashSet::new(),
            forbidden_repetitions: Vec::new(),
            overlaps: Vec::new(),
        }
    }

    /// The story bible memory was seeded with.
    pub fn bible(&self) -> &StoryBible {
        &self.bible
    }

    /// Record an accepted beat.
    #[instrument(skip(self, text, info), fields(words = word_count(text)))]
    pub fn add_beat_context(&mut self, beat_id: usize, text: &str, info: &OutlineBeat) {
        let lowered = text.to_lowercase();

        if let Some(previous) = self.window.back() {
            self.overlaps.push(jaccard(&previous.text, text));
        }

        if self.window.len() == CONTEXT_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(WindowEntry {
            beat_id,
            text: text.to_string(),
        });

        for character in CHARACTER_WORDS {
            if contains_word(&lowered, character) {
                let tracker = self.characters.entry(character.to_string()).or_default();
                tracker.introduced = true;
                tracker.last_mentioned = beat_id;
                tracker.currently_active = true;
            }
        }

        for word in LOCATION_VOCABULARY {
            if lowered.contains(word) {
                let tracker = self.locations.entry(word.to_string()).or_default();
                tracker.introduced = true;
                tracker.last_mentioned = beat_id;
                tracker.currently_active = true;
            }
        }

        for (name, tracker) in self.objects.iter_mut() {
            if lowered.contains(name.as_str()) {
                tracker.introduced = true;
                tracker.last_mentioned = beat_id;
                tracker.currently_active = true;
            }
        }

        let mood = mood_sample(&lowered, info.mood_target.unwrap_or(DEFAULT_MOOD));
        if self.mood_samples.len() == MOOD_WINDOW {
            self.mood_samples.pop_front();
        }
        self.mood_samples.push_back(mood);

        if self.style_samples.len() == STYLE_WINDOW {
            self.style_samples.pop_front();
        }
        self.style_samples.push_back(style_sample(text));

        self.collect_repetitions(&lowered);

        debug!(
            beat_id,
            mood,
            window = self.window.len(),
            repetitions = self.forbidden_repetitions.len(),
            "Beat added to memory"
        );
    }

    /// Continuity reminders for the next prompt, one per line.
    pub fn get_coherence_prompt_additions(&self) -> String {
        let mut lines = Vec::new();

        let characters: Vec<String> = self
            .characters
            .iter()
            .filter(|(_, t)| t.last_mentioned > 0)
            .map(|(name, t)| match &t.description {
                Some(description) => format!("{} ({})", name, description),
                None => name.clone(),
            })
            .collect();
        if !characters.is_empty() {
            lines.push(format!("CHARACTERS ESTABLISHED: {}", characters.join(", ")));
        }

        let locations: Vec<&str> = self
            .locations
            .iter()
            .filter(|(_, t)| t.currently_active)
            .map(|(name, _)| name.as_str())
            .collect();
        if !locations.is_empty() {
            lines.push(format!("CURRENT SETTING: {}", locations.join(", ")));
        }

        let latest = self.latest_beat_id();
        let objects: Vec<&str> = self
            .objects
            .iter()
            .filter(|(_, t)| t.last_mentioned > 0 && t.last_mentioned + 2 >= latest)
            .map(|(name, _)| name.as_str())
            .collect();
        if !objects.is_empty() {
            lines.push(format!("OBJECTS IN SCENE: {}", objects.join(", ")));
        }

        if let Some(average) = self.mood_average() {
            lines.push(format!(
                "MOOD BASELINE: {:.1}/10 (maintain consistency)",
                average
            ));
        }

        if self.style_drift() {
            lines.push("STYLE: Return to calm, flowing narrative style".to_string());
        }

        if !self.forbidden_repetitions.is_empty() {
            let start = self.forbidden_repetitions.len().saturating_sub(3);
            lines.push(format!(
                "AVOID REPEATING: {}",
                self.forbidden_repetitions[start..].join(", ")
            ));
        }

        lines.join("\n")
    }

    /// Score a draft for coherence with the accepted beats.
    #[instrument(skip(self, text))]
    pub fn validate_beat_coherence(&self, text: &str, beat_id: usize) -> CoherenceReport {
        let lowered = text.to_lowercase();
        let mut score = 10.0;
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut checks = BTreeMap::new();

        let repetition = match self.window.back() {
            Some(previous) => {
                let overlap = jaccard(&previous.text, text);
                if overlap > OVERLAP_LIMIT {
                    CheckOutcome::Flagged(vec![format!(
                        "High repetition with previous beat: {:.2}",
                        overlap
                    )])
                } else {
                    CheckOutcome::Clear
                }
            }
            None => CheckOutcome::Skipped("no previous beat".to_string()),
        };
        score -= OVERLAP_PENALTY * repetition.findings().len().min(1) as f64;
        issues.extend(repetition.findings().iter().cloned());
        checks.insert("repetition".to_string(), repetition);

        let character = self.check_characters(&lowered);
        score -= CHARACTER_PENALTY * character.findings().len() as f64;
        issues.extend(character.findings().iter().cloned());
        checks.insert("character".to_string(), character);

        let location = self.check_locations(&lowered);
        score -= LOCATION_PENALTY * location.findings().len() as f64;
        issues.extend(location.findings().iter().cloned());
        checks.insert("location".to_string(), location);

        let mood = self.check_mood(&lowered);
        if !mood.findings().is_empty() {
            score -= MOOD_PENALTY;
        }
        warnings.extend(mood.findings().iter().cloned());
        checks.insert("mood".to_string(), mood);

        let bible = self.check_bible(&lowered);
        score -= BIBLE_PENALTY * bible.findings().len() as f64;
        issues.extend(bible.findings().iter().cloned());
        checks.insert("bible".to_string(), bible);

        let score = f64::max(score, 0.0);
        debug!(score, issues = issues.len(), "Coherence scored");

        CoherenceReport {
            score,
            issues,
            warnings,
            needs_revision: score < REVISION_THRESHOLD,
            severe: score < SEVERE_THRESHOLD,
            checks,
        }
    }

    /// Revision instruction for a draft that needs one.
    pub fn suggest_beat_improvements(&self, text: &str, report: &CoherenceReport) -> Option<String> {
        if !report.needs_revision {
            return None;
        }
        let mut improvements = Vec::new();
        let mentions = |needle: &str| {
            report
                .issues
                .iter()
                .any(|issue| issue.to_lowercase().contains(needle))
        };
        if mentions("repetition") {
            improvements.push("use different words and phrases");
            improvements.push("introduce new sensory details");
        }
        if mentions("character") || mentions("person") {
            improvements.push("keep the second-person perspective");
        }
        if mentions("location") {
            improvements.push("stay consistent with the established setting");
        }
        if mentions("time") {
            improvements.push("keep the established time of day");
        }

        Some(if improvements.is_empty() {
            format!("Please improve the coherence and flow of: {}", text)
        } else {
            format!(
                "Please revise this text to: {}. {}",
                improvements.join(", "),
                text
            )
        })
    }

    /// Trailing `words` words of the text in the context window.
    pub fn previous_text(&self, words: usize) -> String {
        let all: Vec<&str> = self
            .window
            .iter()
            .flat_map(|entry| entry.text.split_whitespace())
            .collect();
        let start = all.len().saturating_sub(words);
        all[start..].join(" ")
    }

    /// Tracker sizes.
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            context_beats: self.window.len(),
            tracked_characters: self.characters.len(),
            tracked_locations: self.locations.len(),
            tracked_objects: self.objects.len(),
            key_phrases: self.key_phrases.len(),
            forbidden_repetitions: self.forbidden_repetitions.len(),
        }
    }

    /// Mean of the mood samples, if any.
    pub fn mood_average(&self) -> Option<f64> {
        if self.mood_samples.is_empty() {
            None
        } else {
            Some(self.mood_samples.iter().sum::<f64>() / self.mood_samples.len() as f64)
        }
    }

    /// Word overlap of each beat with the one before it.
    pub fn overlaps(&self) -> &[f64] {
        &self.overlaps
    }

    /// Repeated phrases, oldest first.
    pub fn forbidden_repetitions(&self) -> &[String] {
        &self.forbidden_repetitions
    }

    /// Locations currently tracked.
    pub fn locations(&self) -> &BTreeMap<String, EntityTracker> {
        &self.locations
    }

    /// Objects currently tracked.
    pub fn objects(&self) -> &BTreeMap<String, EntityTracker> {
        &self.objects
    }

    fn latest_beat_id(&self) -> usize {
        self.window.back().map(|e| e.beat_id).unwrap_or(0)
    }

    fn style_drift(&self) -> bool {
        let n = self.style_samples.len();
        if n < 2 {
            return false;
        }
        let current = self.style_samples[n - 1];
        let previous = self.style_samples[n - 2];
        (current.average_sentence_length - previous.average_sentence_length).abs() > 5.0
            || (current.descriptive_density - previous.descriptive_density).abs() > 0.1
    }

    fn collect_repetitions(&mut self, lowered: &str) {
        let words: Vec<&str> = lowered.split_whitespace().collect();
        for window in words.windows(3) {
            let phrase = window.join(" ");
            if phrase.len() <= 5 {
                continue;
            }
            if self.key_phrases.contains(&phrase) {
                if !self.forbidden_repetitions.contains(&phrase) {
                    self.forbidden_repetitions.push(phrase);
                }
            } else {
                self.key_phrases.insert(phrase.clone());
                self.key_phrase_order.push_back(phrase);
            }
        }
        if self.key_phrases.len() > KEY_PHRASE_CAP {
            while self.key_phrase_order.len() > KEY_PHRASE_KEEP {
                if let Some(oldest) = self.key_phrase_order.pop_front() {
                    self.key_phrases.remove(&oldest);
                }
            }
        }
    }

    fn check_characters(&self, lowered: &str) -> CheckOutcome {
        let drift: Vec<&str> = self
            .first_person
            .iter()
            .copied()
            .filter(|w| contains_word(lowered, w))
            .collect();
        if drift.is_empty() {
            CheckOutcome::Clear
        } else {
            CheckOutcome::Flagged(vec![format!(
                "Character perspective drifts to first person ({})",
                drift.join(", ")
            )])
        }
    }

    fn check_locations(&self, lowered: &str) -> CheckOutcome {
        if self.window.is_empty() {
            return CheckOutcome::Skipped("no accepted beats yet".to_string());
        }
        let setting = self.bible.setting.to_lowercase();
        let waypoints = self.bible.spatial_waypoints.join(" ").to_lowercase();
        let findings = LOCATION_VOCABULARY
            .iter()
            .filter(|word| lowered.contains(**word))
            .filter(|word| !self.locations.contains_key(**word))
            .filter(|word| !setting.contains(**word) && !waypoints.contains(**word))
            .map(|word| format!("Location '{}' introduced without context", word))
            .collect();
        CheckOutcome::from_findings(findings)
    }

    fn check_mood(&self, lowered: &str) -> CheckOutcome {
        if self.mood_samples.is_empty() {
            return CheckOutcome::Skipped("no mood samples yet".to_string());
        }
        if STRESS_WORDS.iter().any(|w| contains_word(lowered, w)) {
            CheckOutcome::Flagged(vec![
                "Text contains potentially jarring elements for sleep content".to_string(),
            ])
        } else {
            CheckOutcome::Clear
        }
    }

    fn check_bible(&self, lowered: &str) -> CheckOutcome {
        let words = tokens(lowered);
        let mut findings = self.time_conflicts(&words);
        findings.extend(self.unknown_held_objects(&words));
        CheckOutcome::from_findings(findings)
    }

    fn time_conflicts(&self, words: &[&str]) -> Vec<String> {
        let time = self.bible.time_of_day.to_lowercase();
        let time_words = tokens(&time);
        let Some((_, conflicts)) = TIME_CONFLICTS
            .iter()
            .find(|(names, _)| names.iter().any(|n| time_words.contains(n)))
        else {
            return Vec::new();
        };
        conflicts
            .iter()
            .filter(|c| words.contains(*c))
            .map(|c| {
                format!(
                    "Time inconsistency: story is set at {} but mentions {}",
                    time, c
                )
            })
            .collect()
    }

    /// Objects the listener holds with a definite reference that the bible
    /// never names.
    fn unknown_held_objects(&self, words: &[&str]) -> Vec<String> {
        let mut findings: Vec<String> = Vec::new();
        for (position, word) in words.iter().enumerate() {
            if !HOLDING_VERBS.contains(word) {
                continue;
            }
            let rest = &words[position + 1..];
            let determiners = rest
                .iter()
                .take_while(|w| OBJECT_DETERMINERS.contains(*w))
                .count();
            if determiners == 0 {
                continue;
            }
            let named: Vec<&str> = rest[determiners..]
                .iter()
                .take(OBJECT_WORDS)
                .copied()
                .collect();
            let Some(head) = named.first() else {
                continue;
            };
            if BODY_WORDS.contains(head) || self.names_key_object(&named) {
                continue;
            }
            let finding = format!(
                "Key object '{}' is not in the story bible",
                named.join(" ")
            );
            if !findings.contains(&finding) {
                findings.push(finding);
            }
        }
        findings
    }

    fn names_key_object(&self, named: &[&str]) -> bool {
        self.objects.keys().any(|object| {
            tokens(object)
                .last()
                .is_some_and(|noun| named.contains(noun))
        })
    }
}

/// Jaccard overlap of the lowercased word sets.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let left: HashSet<&str> = a_lower.split_whitespace().collect();
    let right: HashSet<&str> = b_lower.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let union = left.union(&right).count();
    left.intersection(&right).count() as f64 / union as f64
}

fn contains_word(lowered: &str, word: &str) -> bool {
    lowered
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|token| token == word)
}

fn tokens(lowered: &str) -> Vec<&str> {
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

fn mood_sample(lowered: &str, target: f64) -> f64 {
    let positive = POSITIVE_WORDS.iter().filter(|w| lowered.contains(**w)).count() as f64;
    let negative = NEGATIVE_WORDS.iter().filter(|w| lowered.contains(**w)).count() as f64;
    (target + positive * 0.5 - negative * 1.0).clamp(1.0, 10.0)
}

fn style_sample(text: &str) -> StyleSample {
    let sentences: Vec<&str> = text.split('.').collect();
    let sentence_words: usize = sentences.iter().map(|s| word_count(s)).sum();
    let lowered = text.to_lowercase();
    let descriptive = DESCRIPTIVE_WORDS
        .iter()
        .filter(|w| lowered.contains(**w))
        .count();
    StyleSample {
        average_sentence_length: sentence_words as f64 / sentences.len().max(1) as f64,
        descriptive_density: descriptive as f64 / word_count(text).max(1) as f64,
        paragraph_count: text.split("\n\n").count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_word_respects_boundaries() {
        assert!(contains_word("and then i rest", "i"));
        assert!(!contains_word("il sentiero", "i"));
    }

    #[test]
    fn test_mood_sample_is_clamped() {
        assert_eq!(mood_sample("harsh cold rough loud sharp bitter", 2.0), 1.0);
        assert_eq!(mood_sample("peaceful calm gentle warm soft", 9.5), 10.0);
    }
}
