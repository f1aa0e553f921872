//! Cross-beat repetition tracking.
//!
//! The guard fingerprints every accepted beat (opening words, main action,
//! sensory words), forbids openers that keep coming back, proposes fresh
//! phrasing for the next beat and decides whether a draft is too close to
//! what came before.

use crate::NarrationLanguage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};
use somnia_core::{SensoryMode, split_sentences};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::LazyLock;
use tracing::{debug, instrument, warn};

/// Words that make up an opener.
const OPENER_WORDS: usize = 6;
/// Uses after which an opener is forbidden.
const OPENER_LIMIT: usize = 2;
/// Capacity of the recent-action ring buffer.
const RECENT_ACTIONS: usize = 10;
/// Occurrences in the ring buffer that make an action forbidden.
const ACTION_LIMIT: usize = 3;
/// Fingerprints compared against a new draft.
const SIMILARITY_WINDOW: usize = 3;
/// Similarity above which a draft is regenerated.
const SIMILARITY_THRESHOLD: f64 = 0.7;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = p, error = %e, "Dropping invalid action pattern");
                None
            }
        })
        .collect()
}

static ITALIAN_ACTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b(incammin\w+|avanzi|attraversi|raggiungi|procedi|cammini)\b",
        r"\b(senti|percepisci|noti|osservi|ascolti)\b",
        r"\b(respiri|rilassi|ti\s+fermi|ti\s+soffermi)\b",
    ])
});

static ENGLISH_ACTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b(walk\w*|step\w*|wander\w*|cross\w*|follow\w*|stroll\w*)\b",
        r"\b(notice\w*|hear\w*|feel\w*|sense\w*|listen\w*)\b",
        r"\b(breathe\w*|relax\w*|rest\w*|pause\w*)\b",
    ])
});

/// Word tables the guard works from.
#[derive(Debug, Clone, Copy)]
pub struct RepetitionLexicon {
    actions: &'static LazyLock<Vec<Regex>>,
    sensory_words: [(SensoryMode, &'static [&'static str]); 5],
    sensory_phrases: [(SensoryMode, &'static [&'static str]); 5],
    movement_phrases: &'static [&'static str],
    transition_phrases: &'static [&'static str],
    waypoint_synonyms: &'static [(&'static str, &'static [&'static str])],
}

const SENSORY_PHRASES: [(SensoryMode, &[&str]); 5] = [
    (
        SensoryMode::Sight,
        &[
            "dappled light filtering through",
            "gentle shadows dancing",
            "soft gleam reflecting",
            "distant shimmer catching",
            "warm glow emanating",
            "subtle patterns emerging",
            "peaceful vista opening",
            "tranquil scene unfolding",
        ],
    ),
    (
        SensoryMode::Sound,
        &[
            "whispered breeze carrying",
            "distant rustle suggesting",
            "soft murmur echoing",
            "gentle echo resonating",
            "rhythmic patter creating",
            "melodic hum surrounding",
            "soothing cadence flowing",
            "harmonious blend arising",
        ],
    ),
    (
        SensoryMode::Touch,
        &[
            "warm embrace enveloping",
            "cool caress touching",
            "gentle pressure guiding",
            "soft texture welcoming",
            "smooth surface supporting",
            "tender contact reassuring",
            "comforting sensation spreading",
            "delicate touch soothing",
        ],
    ),
    (
        SensoryMode::Smell,
        &[
            "earthy fragrance drifting",
            "sweet scent lingering",
            "fresh aroma surrounding",
            "subtle perfume wafting",
            "natural essence filling",
            "pleasant bouquet greeting",
        ],
    ),
    (
        SensoryMode::Proprioception,
        &[
            "body naturally settling",
            "muscles gently releasing",
            "breathing gradually slowing",
            "posture softly adjusting",
            "weight comfortably shifting",
            "tension peacefully dissolving",
        ],
    ),
];

impl RepetitionLexicon {
    /// Italian tables.
    pub fn italian() -> Self {
        Self {
            actions: &ITALIAN_ACTIONS,
            sensory_words: [
                (
                    SensoryMode::Sight,
                    &["vedi", "osservi", "noti", "luce", "ombra", "colore"],
                ),
                (
                    SensoryMode::Sound,
                    &["senti", "ascolti", "suono", "rumore", "melodia", "eco"],
                ),
                (
                    SensoryMode::Touch,
                    &["tocchi", "senti", "morbido", "caldo", "fresco", "texture"],
                ),
                (
                    SensoryMode::Smell,
                    &["profumo", "odore", "fragranza", "aroma"],
                ),
                (
                    SensoryMode::Proprioception,
                    &["equilibrio", "postura", "muscoli", "respiro"],
                ),
            ],
            sensory_phrases: SENSORY_PHRASES,
            movement_phrases: &[
                "ti incammini verso",
                "procedi lungo",
                "attraversi dolcemente",
                "raggiungi serenamente",
                "ti dirigi verso",
                "avanzi attraverso",
                "scivoli oltre",
                "ti sposti verso",
                "cammini fino a",
                "approdi a",
                "giungi presso",
                "arrivi in prossimità di",
            ],
            transition_phrases: &[
                "più avanti",
                "oltre il",
                "proseguendo",
                "continuando il cammino",
                "addentrandoti",
                "seguendo il sentiero",
                "attraversando",
                "superando",
                "man mano che procedi",
                "mentre avanzi",
                "nel tuo procedere",
            ],
            waypoint_synonyms: &[
                ("forest", &["bosco", "foresta", "area boschiva", "zona silvestre"]),
                ("path", &["sentiero", "cammino", "traccia", "via", "percorso"]),
                (
                    "clearing",
                    &["radura", "spazio aperto", "piccola piazza", "area libera"],
                ),
                (
                    "bridge",
                    &["ponte", "attraversamento", "passaggio", "collegamento"],
                ),
                ("stream", &["ruscello", "corso d'acqua", "rivolo", "torrente"]),
            ],
        }
    }

    /// English tables.
    pub fn english() -> Self {
        Self {
            actions: &ENGLISH_ACTIONS,
            sensory_words: [
                (
                    SensoryMode::Sight,
                    &["see", "notice", "light", "shadow", "colour", "color"],
                ),
                (
                    SensoryMode::Sound,
                    &["hear", "listen", "sound", "murmur", "melody", "echo"],
                ),
                (
                    SensoryMode::Touch,
                    &["touch", "feel", "soft", "warm", "cool", "texture"],
                ),
                (
                    SensoryMode::Smell,
                    &["scent", "smell", "fragrance", "aroma"],
                ),
                (
                    SensoryMode::Proprioception,
                    &["balance", "posture", "muscles", "breath"],
                ),
            ],
            sensory_phrases: SENSORY_PHRASES,
            movement_phrases: &[
                "you wander toward",
                "you follow along",
                "you cross gently",
                "you drift past",
                "you make your way to",
                "you stroll through",
                "you step beyond",
                "you move toward",
            ],
            transition_phrases: &[
                "further along",
                "beyond the",
                "a little further",
                "following the path",
                "as you continue",
                "past the",
                "deeper in",
                "around the bend",
            ],
            waypoint_synonyms: &[
                ("forest", &["woods", "woodland", "trees"]),
                ("path", &["trail", "track", "footpath", "way"]),
                ("clearing", &["glade", "open space", "quiet clearing"]),
                ("bridge", &["footbridge", "crossing", "span"]),
                ("stream", &["brook", "creek", "rivulet"]),
            ],
        }
    }

    /// Tables for a narration language.
    pub fn for_language(language: NarrationLanguage) -> Self {
        match language {
            NarrationLanguage::Italian => Self::italian(),
            NarrationLanguage::English => Self::english(),
        }
    }

    fn sensory_phrases_for(&self, mode: SensoryMode) -> &'static [&'static str] {
        self.sensory_phrases
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, phrases)| *phrases)
            .unwrap_or(&[])
    }
}

impl Default for RepetitionLexicon {
    fn default() -> Self {
        Self::italian()
    }
}

/// What the guard remembers about one accepted beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatFingerprint {
    /// Beat position
    pub index: usize,
    /// First words of the beat, lowercased
    pub opener: String,
    /// First action token found, or empty
    pub main_action: String,
    /// First matching word per sensory channel
    pub sensory: BTreeMap<SensoryMode, String>,
}

/// Fresh phrasing proposed for the next beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueElements {
    /// Sensory phrase for the focus channel
    pub sensory: String,
    /// Movement phrase
    pub movement: String,
    /// Transition phrase
    pub transition: String,
    /// Paraphrase of the waypoint label
    pub waypoint_variation: String,
}

/// Tracks repetition across the beats of one run.
///
/// Forbidden openers only ever accumulate during a run.
#[derive(Debug)]
pub struct RepetitionGuard {
    lexicon: RepetitionLexicon,
    opener_counts: HashMap<String, usize>,
    forbidden_openers: BTreeSet<String>,
    recent_actions: VecDeque<String>,
    fingerprints: Vec<BeatFingerprint>,
    proposals: VecDeque<UniqueElements>,
    rng: StdRng,
}

impl RepetitionGuard {
    /// Guard with the default (Italian) tables.
    ///
    /// With a seed, phrase selection is reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_lexicon(RepetitionLexicon::default(), seed)
    }

    /// Guard with explicit tables.
    pub fn with_lexicon(lexicon: RepetitionLexicon, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            lexicon,
            opener_counts: HashMap::new(),
            forbidden_openers: BTreeSet::new(),
            recent_actions: VecDeque::with_capacity(RECENT_ACTIONS),
            fingerprints: Vec::new(),
            proposals: VecDeque::with_capacity(SIMILARITY_WINDOW),
            rng,
        }
    }

    /// Record an accepted beat.
    #[instrument(skip(self, text), fields(beat_index = index))]
    pub fn track_beat_content(&mut self, text: &str, index: usize) {
        for sentence in split_sentences(text) {
            let opener = extract_opener(sentence);
            if opener.is_empty() {
                continue;
            }
            let count = self.opener_counts.entry(opener.clone()).or_insert(0);
            *count += 1;
            if *count > OPENER_LIMIT && self.forbidden_openers.insert(opener.clone()) {
                debug!(opener = %opener, "Opener forbidden");
            }
        }

        for action in self.extract_actions(text) {
            if self.recent_actions.len() == RECENT_ACTIONS {
                self.recent_actions.pop_front();
            }
            self.recent_actions.push_back(action);
        }

        let fingerprint = BeatFingerprint {
            index,
            opener: extract_opener(text),
            main_action: self.main_action(text),
            sensory: self.extract_sensory(text),
        };
        debug!(
            opener = %fingerprint.opener,
            main_action = %fingerprint.main_action,
            "Beat fingerprinted"
        );
        self.fingerprints.push(fingerprint);
    }

    /// Openers and overused actions to keep out of the next beat.
    ///
    /// Forbidden openers come first in sorted order, then actions appearing at
    /// least three times among the recent ones.
    pub fn get_forbidden_phrases(&self) -> Vec<String> {
        let mut phrases: Vec<String> = self.forbidden_openers.iter().cloned().collect();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for action in &self.recent_actions {
            *counts.entry(action.as_str()).or_insert(0) += 1;
        }
        phrases.extend(
            counts
                .into_iter()
                .filter(|(_, count)| *count >= ACTION_LIMIT)
                .map(|(action, _)| action.to_string()),
        );
        phrases
    }

    /// Propose phrasing not used in the last few beats.
    #[instrument(skip(self))]
    pub fn generate_unique_elements(
        &mut self,
        sensory_focus: SensoryMode,
        waypoint: &str,
        beat_index: usize,
    ) -> UniqueElements {
        let recent_sensory: Vec<&str> = self
            .fingerprints
            .iter()
            .rev()
            .take(3)
            .filter_map(|f| f.sensory.get(&sensory_focus).map(String::as_str))
            .chain(self.proposals.iter().rev().take(3).map(|p| p.sensory.as_str()))
            .collect();
        let recent_movement: Vec<&str> = self
            .fingerprints
            .iter()
            .rev()
            .take(3)
            .map(|f| f.main_action.as_str())
            .chain(self.proposals.iter().rev().take(3).map(|p| p.movement.as_str()))
            .collect();
        let recent_transition: Vec<&str> = self
            .fingerprints
            .iter()
            .rev()
            .take(2)
            .map(|f| f.main_action.as_str())
            .chain(
                self.proposals
                    .iter()
                    .rev()
                    .take(2)
                    .map(|p| p.transition.as_str()),
            )
            .collect();

        let sensory_pool = self.lexicon.sensory_phrases_for(sensory_focus);
        let sensory = pick_fresh(&mut self.rng, sensory_pool, &recent_sensory);
        let movement = pick_fresh(&mut self.rng, self.lexicon.movement_phrases, &recent_movement);
        let transition = pick_fresh(
            &mut self.rng,
            self.lexicon.transition_phrases,
            &recent_transition,
        );
        let waypoint_variation = self.vary_waypoint(waypoint);

        let elements = UniqueElements {
            sensory,
            movement,
            transition,
            waypoint_variation,
        };

        if self.proposals.len() == SIMILARITY_WINDOW {
            self.proposals.pop_front();
        }
        self.proposals.push_back(elements.clone());
        debug!(?elements, "Proposed unique elements");
        elements
    }

    /// Whether a draft should be regenerated.
    ///
    /// True for empty text, a forbidden opener, or similarity above 0.7 with
    /// any of the last three beats.
    pub fn should_regenerate_beat(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return true;
        }
        let opener = extract_opener(text);
        if self.forbidden_openers.contains(&opener) {
            debug!(opener = %opener, "Draft starts with a forbidden opener");
            return true;
        }
        let action = self.main_action(text);
        let start = self.fingerprints.len().saturating_sub(SIMILARITY_WINDOW);
        self.fingerprints[start..].iter().any(|f| {
            let opener_sim = if opener == f.opener { 1.0 } else { 0.0 };
            let action_sim = if !action.is_empty() && action == f.main_action {
                1.0
            } else {
                0.0
            };
            (opener_sim + action_sim) / 2.0 > SIMILARITY_THRESHOLD
        })
    }

    /// First words of the whole text, as the guard compares them.
    pub fn opener_of(text: &str) -> String {
        extract_opener(text)
    }

    /// Forbidden openers, sorted.
    pub fn forbidden_openers(&self) -> &BTreeSet<String> {
        &self.forbidden_openers
    }

    /// Fingerprints of accepted beats, oldest first.
    pub fn fingerprints(&self) -> &[BeatFingerprint] {
        &self.fingerprints
    }

    fn extract_actions(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.lexicon
            .actions
            .iter()
            .flat_map(|re| {
                re.captures_iter(&lowered)
                    .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn main_action(&self, text: &str) -> String {
        self.extract_actions(text)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    fn extract_sensory(&self, text: &str) -> BTreeMap<SensoryMode, String> {
        let lowered = text.to_lowercase();
        self.lexicon
            .sensory_words
            .iter()
            .filter_map(|(mode, words)| {
                words
                    .iter()
                    .find(|w| lowered.contains(**w))
                    .map(|w| (*mode, (*w).to_string()))
            })
            .collect()
    }

    fn vary_waypoint(&mut self, waypoint: &str) -> String {
        if waypoint.is_empty() {
            return String::new();
        }
        let lowered = waypoint.to_lowercase();
        for (key, variants) in self.lexicon.waypoint_synonyms {
            if lowered.contains(*key) {
                if let Some(choice) = variants.choose(&mut self.rng) {
                    return (*choice).to_string();
                }
            }
        }
        waypoint.to_string()
    }
}

fn extract_opener(sentence: &str) -> String {
    sentence
        .split_whitespace()
        .take(OPENER_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn pick_fresh(rng: &mut StdRng, pool: &[&str], recent: &[&str]) -> String {
    let available: Vec<&str> = pool
        .iter()
        .copied()
        .filter(|candidate| !recent.contains(candidate))
        .collect();
    available
        .choose(rng)
        .or_else(|| pool.first())
        .map(|s| (*s).to_string())
        .unwrap_or_default()
}
