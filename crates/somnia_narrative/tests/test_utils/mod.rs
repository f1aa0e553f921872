//! Test utilities for Somnia narrative tests.
//!
//! Mock inference drivers: scripted answers, permanent failure, and a story
//! driver that answers each kind of prompt the coordinator sends.

#![allow(dead_code)]

use async_trait::async_trait;
use somnia_core::{InferenceRequest, InferenceResponse};
use somnia_error::{InferenceError, InferenceErrorKind, SomniaResult};
use somnia_interface::InferenceDriver;
use somnia_narrative::{GenerationConfig, RetryPolicy};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Italian beats that pass every embodiment check and carry all three arc
/// phases.
pub const COMPLIANT_BEATS: [&str; 4] = [
    "Stanotte ti incammini verso il rifugio nel bosco. Più avanti senti sotto i piedi l'erba fresca, e la luce morbida filtra tra i rami. Il respiro rallenta mentre raggiungi la radura.",
    "Questa sera avanzi piano verso la casetta, e poco più in là l'aria profuma di resina. Le tue mani sfiorano la corteccia tiepida mentre il respiro si fa più lento. Ti fermi un istante, poi raggiungi il ponte di legno.",
    "Lungo il sentiero attraversi il prato in silenzio, e oltre il ruscello la luce della luna si posa sull'acqua. Senti le spalle che si sciolgono e il respiro che si allunga. Stanotte ti avvicini alla meta, e arrivi al rifugio.",
    "Dolcemente prosegui verso la radura, e appena dopo il vecchio faggio il fruscio delle foglie ti accompagna. Sotto i tuoi piedi il muschio è morbido e il respiro rilassa il petto. Stanotte hai raggiunto il tuo rifugio.",
];

/// A beat that fails most embodiment checks.
pub const FLAT_BEAT: &str = "Il bosco è quieto e scuro.";

pub const THEME_JSON: &str = r#"Here is the analysis:
```json
{
  "setting": "pine forest at dusk",
  "time_of_day": "dusk",
  "mood": "peaceful",
  "sensory_elements": ["visual", "audio"],
  "key_objects": ["lantern"],
  "atmosphere": "calm",
  "spatial_waypoints": ["sentiero", "radura", "ruscello", "rifugio"]
}
```"#;

pub const OUTLINE_JSON: &str = r#"{
  "story_bible": {
    "setting": "pine forest at dusk",
    "time_of_day": "dusk",
    "mood_baseline": 8,
    "key_objects": ["lantern"],
    "spatial_waypoints": ["sentiero", "radura", "ruscello", "rifugio"]
  },
  "acts": [
    {
      "act_number": 1,
      "title": "Departure",
      "beats": [
        {"beat_id": 1, "title": "The Promise", "description": "Set out toward the shelter", "sensory_focus": ["sight"], "waypoint": "sentiero", "mood_target": 8},
        {"beat_id": 2, "title": "The Clearing", "description": "Cross the clearing", "sensory_focus": ["sound"], "waypoint": "radura", "mood_target": 8}
      ]
    },
    {
      "act_number": 2,
      "title": "Arrival",
      "beats": [
        {"beat_id": 3, "title": "The Stream", "description": "Follow the stream", "sensory_focus": ["touch"], "waypoint": "ruscello", "mood_target": 9},
        {"beat_id": 4, "title": "The Shelter", "description": "Arrive and rest", "sensory_focus": ["smell"], "waypoint": "rifugio", "mood_target": 9}
      ]
    }
  ]
}"#;

/// Configuration with a short retry delay and `beats` beats.
pub fn fast_config(beats: usize) -> GenerationConfig {
    GenerationConfig {
        beats,
        retry: RetryPolicy {
            max_attempts: 3,
            delay_ms: 0,
            fallback_model: "fallback:1b".to_string(),
        },
        ..GenerationConfig::default()
    }
}

fn transport_error() -> somnia_error::SomniaError {
    InferenceError::new(InferenceErrorKind::Transport("connection refused".to_string())).into()
}

/// Returns scripted answers in order, then fails.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    answers: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
    models: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    /// Driver answering with `answers`; `None` entries fail.
    pub fn new(answers: Vec<Option<&str>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(str::to_string)).collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceDriver for ScriptedDriver {
    async fn generate(&self, request: &InferenceRequest) -> SomniaResult<InferenceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.models.lock().unwrap().push(request.model().clone());
        let next = self.answers.lock().unwrap().pop_front().flatten();
        match next {
            Some(text) => Ok(InferenceResponse::from_text(request.model().as_str(), text)),
            None => Err(transport_error()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Fails every call.
#[derive(Debug, Default)]
pub struct FailingDriver {
    calls: AtomicUsize,
    models: Mutex<Vec<String>>,
}

impl FailingDriver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceDriver for FailingDriver {
    async fn generate(&self, request: &InferenceRequest) -> SomniaResult<InferenceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.models.lock().unwrap().push(request.model().clone());
        Err(transport_error())
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// Answers theme, outline and coach prompts with fixtures and every other
/// prompt with beat text.
///
/// With `flat_drafts`, beat drafts fail embodiment and only corrective
/// rewrites come back compliant.
#[derive(Debug, Default)]
pub struct StoryDriver {
    flat_drafts: bool,
    story_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flat_drafts() -> Self {
        Self {
            flat_drafts: true,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn prompts_containing(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }
}

#[async_trait]
impl InferenceDriver for StoryDriver {
    async fn generate(&self, request: &InferenceRequest) -> SomniaResult<InferenceResponse> {
        let prompt = request.prompt();
        self.prompts.lock().unwrap().push(prompt.clone());

        let text = if prompt.contains("3-act outline") || prompt.contains("valid JSON outline") {
            OUTLINE_JSON.to_string()
        } else if prompt.contains("creative analyst") || prompt.contains("Output valid JSON with")
        {
            THEME_JSON.to_string()
        } else if prompt.contains("spatial journey coach") {
            "Ti incammini oltre il ponte e senti l'aria sulle mani.".to_string()
        } else {
            let n = self.story_calls.fetch_add(1, Ordering::SeqCst);
            if self.flat_drafts && !prompt.contains("EMBODIMENT AND DESTINATION REVISION") {
                FLAT_BEAT.to_string()
            } else {
                COMPLIANT_BEATS[n % COMPLIANT_BEATS.len()].to_string()
            }
        };
        Ok(InferenceResponse::from_text(request.model().as_str(), text))
    }

    fn provider_name(&self) -> &'static str {
        "story"
    }
}
