//! Pluggable text detectors and the lexicons built from them.
//!
//! Validators never match words directly; they ask a [`Detector`] whether a
//! lowercased text shows some property. Lexicons bundle the detectors for one
//! narration language and can be swapped wholesale.

use crate::NarrationLanguage;
use std::fmt::Debug;

/// Answers one yes/no question about a lowercased text.
pub trait Detector: Debug + Send + Sync {
    /// Whether `lowered` shows the property.
    fn detect(&self, lowered: &str) -> bool;
}

/// Matches when any keyword occurs as a substring.
///
/// Keywords may be stems (`"incammin"`) or multi-word phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDetector {
    keywords: Vec<String>,
}

impl KeywordDetector {
    /// Detector for the given keywords (lowercased on construction).
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Keywords in declaration order.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First keyword found in `lowered`, if any.
    pub fn first_match(&self, lowered: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }
}

impl Detector for KeywordDetector {
    fn detect(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Matches when every inner detector matches.
#[derive(Debug)]
pub struct AllOf(pub Vec<Box<dyn Detector>>);

impl Detector for AllOf {
    fn detect(&self, lowered: &str) -> bool {
        self.0.iter().all(|d| d.detect(lowered))
    }
}

/// Second-person address: a standalone pronoun, a leading pronoun, or a
/// possessive marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondPersonDetector {
    pronoun: &'static str,
    possessive: &'static str,
}

impl SecondPersonDetector {
    /// Italian: `ti` and `i tuoi`.
    pub fn italian() -> Self {
        Self {
            pronoun: "ti",
            possessive: " i tuoi",
        }
    }

    /// English: `you` and `your`.
    pub fn english() -> Self {
        Self {
            pronoun: "you",
            possessive: " your",
        }
    }
}

impl Detector for SecondPersonDetector {
    fn detect(&self, lowered: &str) -> bool {
        let padded = format!(" {} ", lowered);
        padded.contains(&format!(" {} ", self.pronoun))
            || lowered.trim_start().starts_with(&format!("{} ", self.pronoun))
            || lowered.contains(self.possessive)
    }
}

/// Detectors for the five embodiment checks.
#[derive(Debug)]
pub struct EmbodimentLexicon {
    /// Movement verb stems
    pub movement: Box<dyn Detector>,
    /// Spatial transition connectors
    pub transition: Box<dyn Detector>,
    /// Body-centred perception words
    pub corporeal: Box<dyn Detector>,
    /// Environment perception words
    pub environmental: Box<dyn Detector>,
    /// Relaxation cues
    pub downshift: Box<dyn Detector>,
    /// Second-person address
    pub second_person: Box<dyn Detector>,
}

impl EmbodimentLexicon {
    /// Italian lexicon.
    pub fn italian() -> Self {
        Self {
            movement: Box::new(KeywordDetector::new([
                "incammin", "avanz", "attravers", "super", "raggiung", "scend", "risal", "volt",
                "prosegu", "sost",
            ])),
            transition: Box::new(KeywordDetector::new([
                "più avanti",
                "oltre il",
                "svolti",
                "superi",
                "raggiungi",
                "scendi",
                "risali",
                "appena dopo",
                "di fronte",
                "poco più in là",
            ])),
            corporeal: Box::new(KeywordDetector::new([
                "pied", "mani", "spalle", "respiro", "petto", "palpebre", "collo", "schiena",
            ])),
            environmental: Box::new(KeywordDetector::new([
                "luce", "suono", "fruscio", "profumo", "odore", "aria", "erba", "acqua", "foglia",
            ])),
            downshift: Box::new(KeywordDetector::new([
                "respiro",
                "rilassa",
                "si allunga",
                "si scioglie",
                "più lento",
            ])),
            second_person: Box::new(SecondPersonDetector::italian()),
        }
    }

    /// English lexicon.
    pub fn english() -> Self {
        Self {
            movement: Box::new(KeywordDetector::new([
                "walk", "step", "wander", "stroll", "cross", "follow", "climb", "descend",
                "turn", "continue", "drift",
            ])),
            transition: Box::new(KeywordDetector::new([
                "further along",
                "beyond the",
                "past the",
                "across the",
                "just after",
                "around the bend",
                "a little further",
                "ahead of you",
            ])),
            corporeal: Box::new(KeywordDetector::new([
                "feet", "hands", "shoulders", "breath", "chest", "eyelids", "neck", "back",
            ])),
            environmental: Box::new(KeywordDetector::new([
                "light", "sound", "rustle", "scent", "smell", "air", "grass", "water", "leaf",
                "leaves",
            ])),
            downshift: Box::new(KeywordDetector::new([
                "breath",
                "relax",
                "lengthens",
                "loosens",
                "slower",
                "softens",
            ])),
            second_person: Box::new(SecondPersonDetector::english()),
        }
    }

    /// Lexicon for a narration language.
    pub fn for_language(language: NarrationLanguage) -> Self {
        match language {
            NarrationLanguage::Italian => Self::italian(),
            NarrationLanguage::English => Self::english(),
        }
    }
}

impl Default for EmbodimentLexicon {
    fn default() -> Self {
        Self::italian()
    }
}

/// Detectors for the three destination arc phases.
#[derive(Debug)]
pub struct DestinationLexicon {
    /// Promise of tonight's journey, co-occurring with a goal word
    pub promise: Box<dyn Detector>,
    /// Markers of drawing closer
    pub progress: Box<dyn Detector>,
    /// Arrival language
    pub arrival: Box<dyn Detector>,
}

impl DestinationLexicon {
    /// Italian lexicon.
    pub fn italian() -> Self {
        Self {
            promise: Box::new(AllOf(vec![
                Box::new(KeywordDetector::new([
                    "stanotte",
                    "questa notte",
                    "questa sera",
                    "questa camminata",
                    "questa passeggiata",
                ])),
                Box::new(KeywordDetector::new([
                    "verso",
                    "raggiungere",
                    "meta",
                    "destinazione",
                ])),
            ])),
            progress: Box::new(KeywordDetector::new([
                "più vicino",
                "più avanti",
                "verso",
                "in lontan",
                "si avvicina",
                "approssimi",
                "ti avvicini",
            ])),
            arrival: Box::new(KeywordDetector::new([
                "hai raggiunto",
                "sei arrivato",
                "arrivi",
                "raggiungi",
                "giungi",
            ])),
        }
    }

    /// English lexicon.
    pub fn english() -> Self {
        Self {
            promise: Box::new(AllOf(vec![
                Box::new(KeywordDetector::new([
                    "tonight",
                    "this evening",
                    "this walk",
                    "this journey",
                ])),
                Box::new(KeywordDetector::new([
                    "toward",
                    "reach",
                    "destination",
                    "waiting for you",
                ])),
            ])),
            progress: Box::new(KeywordDetector::new([
                "closer",
                "nearer",
                "further along",
                "toward",
                "in the distance",
                "draws near",
                "approach",
            ])),
            arrival: Box::new(KeywordDetector::new([
                "you have reached",
                "you have arrived",
                "you arrive",
                "you reach",
                "arrival",
            ])),
        }
    }

    /// Lexicon for a narration language.
    pub fn for_language(language: NarrationLanguage) -> Self {
        match language {
            NarrationLanguage::Italian => Self::italian(),
            NarrationLanguage::English => Self::english(),
        }
    }
}

impl Default for DestinationLexicon {
    fn default() -> Self {
        Self::italian()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_person_italian_forms() {
        let detector = SecondPersonDetector::italian();
        assert!(detector.detect("ti fermi un momento"));
        assert!(detector.detect("poi ti volti"));
        assert!(detector.detect("senti i tuoi passi"));
        assert!(!detector.detect("il sentiero continua"));
    }

    #[test]
    fn test_all_of_requires_every_detector() {
        let promise = DestinationLexicon::italian().promise;
        assert!(promise.detect("stanotte cammini verso il lago"));
        assert!(!promise.detect("stanotte cammini piano"));
    }
}
