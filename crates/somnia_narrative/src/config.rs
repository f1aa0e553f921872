//! Generation configuration, presets and load-time validation.

use serde::{Deserialize, Serialize};
use somnia_error::{ConfigError, SomniaError, SomniaResult};
use std::path::Path;

/// Model identifiers for each pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRoster {
    /// Creative first-draft model
    pub generator: String,
    /// Coherence editor model
    pub reasoner: String,
    /// Style polish model
    pub polisher: String,
    /// Run the reasoner stage
    pub use_reasoner: bool,
    /// Run the polish stage
    pub use_polish: bool,
}

impl Default for ModelRoster {
    fn default() -> Self {
        Self {
            generator: "qwen3:8b".to_string(),
            reasoner: "deepseek-r1:8b".to_string(),
            polisher: "mistral:7b".to_string(),
            use_reasoner: true,
            use_polish: true,
        }
    }
}

/// Sampling temperature for each stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTemperatures {
    /// Generator temperature
    pub generator: f32,
    /// Reasoner temperature
    pub reasoner: f32,
    /// Polisher temperature
    pub polisher: f32,
}

impl Default for StageTemperatures {
    fn default() -> Self {
        Self {
            generator: 0.7,
            reasoner: 0.3,
            polisher: 0.4,
        }
    }
}

/// Sleep taper: beats past `start_fraction` of the story shrink to `reduction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaperConfig {
    /// Story progress (0–1) after which beats are shortened
    pub start_fraction: f64,
    /// Density multiplier applied to tapered beats
    pub reduction: f64,
}

impl Default for TaperConfig {
    fn default() -> Self {
        Self {
            start_fraction: 0.80,
            reduction: 0.70,
        }
    }
}

impl TaperConfig {
    /// Density factor for a beat at `progress` (0–1).
    pub fn density_for(&self, progress: f64) -> f64 {
        if progress > self.start_fraction {
            self.reduction
        } else {
            1.0
        }
    }
}

/// Retry behaviour for inference calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Calls to the primary model before falling back
    pub max_attempts: usize,
    /// Fixed delay between primary attempts, in milliseconds
    pub delay_ms: u64,
    /// Model tried once after the primary is exhausted
    pub fallback_model: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
            fallback_model: "qwen3:8b".to_string(),
        }
    }
}

impl RetryPolicy {
    /// Delay between attempts.
    pub fn delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay_ms)
    }
}

/// Text-to-speech marker settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Keep and insert markers by default
    pub markers: bool,
    /// Shortest pause between beats, in seconds
    pub pause_min: f64,
    /// Longest pause between beats, in seconds
    pub pause_max: f64,
    /// Insert `[BREATHE]` after every N sentences
    pub breathe_every: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            markers: false,
            pause_min: 0.5,
            pause_max: 3.0,
            breathe_every: 4,
        }
    }
}

/// Embodied-journey requirements rendered into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbodimentRequirements {
    /// Movement verbs expected per beat
    pub movement_verbs_required: usize,
    /// Spatial connectors expected per beat
    pub transition_tokens_required: usize,
    /// Coupled sensory perceptions expected per beat
    pub sensory_coupling: usize,
    /// Ask for breath/relaxation cues
    pub downshift_required: bool,
    /// Insist on second person present tense
    pub pov_enforce_second_person: bool,
}

impl Default for EmbodimentRequirements {
    fn default() -> Self {
        Self {
            movement_verbs_required: 1,
            transition_tokens_required: 1,
            sensory_coupling: 2,
            downshift_required: true,
            pov_enforce_second_person: true,
        }
    }
}

/// Shape of the destination arc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Beats (from the start) that carry the destination promise
    pub promise_beats: usize,
    /// Story progress after which the approach begins
    pub arrival_signals_start: f64,
    /// Final beats spent arriving and settling
    pub settlement_beats: usize,
    /// Ask for explicit closure and rest invitation
    pub closure_required: bool,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            promise_beats: 1,
            arrival_signals_start: 0.7,
            settlement_beats: 2,
            closure_required: true,
        }
    }
}

/// Language the story is narrated in; selects the validator lexicons.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NarrationLanguage {
    /// Italian narration
    #[default]
    Italian,
    /// English narration
    English,
}

impl NarrationLanguage {
    /// Language name as written in prompts.
    pub fn name(self) -> &'static str {
        match self {
            Self::Italian => "Italian",
            Self::English => "English",
        }
    }

    /// Prompt line telling the model which language to write in.
    pub fn directive(self) -> String {
        format!("LANGUAGE: Write in {} only.", self.name())
    }
}

/// Complete configuration for one generation run.
///
/// Every field has a default, so a TOML file only needs the values it
/// changes. Files are validated on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Narration speed used for word targets and timing
    pub target_wpm: u32,
    /// Beats per story
    pub beats: usize,
    /// Nominal words per beat, used when no duration is given
    pub words_per_beat: usize,
    /// Accepted relative deviation from a beat target
    pub length_tolerance: f64,
    /// Stage models
    pub models: ModelRoster,
    /// Stage temperatures
    pub temperatures: StageTemperatures,
    /// Sleep taper
    pub taper: TaperConfig,
    /// Inference retry policy
    pub retry: RetryPolicy,
    /// TTS marker settings
    pub tts: TtsConfig,
    /// Embodiment requirements for prompts
    pub embodiment: EmbodimentRequirements,
    /// Destination arc shape
    pub destination: DestinationConfig,
    /// Token budget for beat calls
    pub max_tokens_beat: u32,
    /// Token budget for theme and outline calls
    pub max_tokens_outline: u32,
    /// Corrective passes after validation
    pub correction_passes: usize,
    /// Opener repeats before the critique flags it
    pub opener_penalty_threshold: usize,
    /// Sensory words per word above which the critique asks to thin them
    pub sensory_density_threshold: f64,
    /// Regenerations allowed per beat when the repetition guard objects
    pub repetition_regen_budget: usize,
    /// Attempts for the theme and outline calls
    pub outline_attempts: usize,
    /// Narration language
    pub language: NarrationLanguage,
    /// Ask the reasoner for a spatial brief during corrections
    pub spatial_coach: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            target_wpm: 140,
            beats: 12,
            words_per_beat: 600,
            length_tolerance: 0.10,
            models: ModelRoster::default(),
            temperatures: StageTemperatures::default(),
            taper: TaperConfig::default(),
            retry: RetryPolicy::default(),
            tts: TtsConfig::default(),
            embodiment: EmbodimentRequirements::default(),
            destination: DestinationConfig::default(),
            max_tokens_beat: 800,
            max_tokens_outline: 1500,
            correction_passes: 1,
            opener_penalty_threshold: 3,
            sensory_density_threshold: 0.15,
            repetition_regen_budget: 1,
            outline_attempts: 3,
            language: NarrationLanguage::default(),
            spatial_coach: false,
        }
    }
}

impl GenerationConfig {
    /// Load a configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed, or
    /// if any field fails [`validate`](Self::validate).
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> SomniaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SomniaError::from(ConfigError::new(format!(
                "Failed to read config file: {}",
                e
            )))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed TOML or invalid values.
    pub fn from_toml_str(content: &str) -> SomniaResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            SomniaError::from(ConfigError::new(format!("Failed to parse config: {}", e)))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beats == 0 {
            return Err(ConfigError::invalid_field("beats", "must be at least 1"));
        }
        if self.target_wpm == 0 {
            return Err(ConfigError::invalid_field("target_wpm", "must be at least 1"));
        }
        if self.words_per_beat == 0 {
            return Err(ConfigError::invalid_field(
                "words_per_beat",
                "must be at least 1",
            ));
        }
        if !(self.length_tolerance > 0.0 && self.length_tolerance < 1.0) {
            return Err(ConfigError::invalid_field(
                "length_tolerance",
                format!("must be in (0, 1), got {}", self.length_tolerance),
            ));
        }
        if !(self.taper.start_fraction > 0.0 && self.taper.start_fraction <= 1.0) {
            return Err(ConfigError::invalid_field(
                "taper.start_fraction",
                format!("must be in (0, 1], got {}", self.taper.start_fraction),
            ));
        }
        if !(self.taper.reduction > 0.0 && self.taper.reduction <= 1.0) {
            return Err(ConfigError::invalid_field(
                "taper.reduction",
                format!("must be in (0, 1], got {}", self.taper.reduction),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid_field(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        if self.outline_attempts == 0 {
            return Err(ConfigError::invalid_field(
                "outline_attempts",
                "must be at least 1",
            ));
        }
        if self.models.generator.trim().is_empty() {
            return Err(ConfigError::invalid_field(
                "models.generator",
                "must not be empty",
            ));
        }
        if self.models.use_reasoner && self.models.reasoner.trim().is_empty() {
            return Err(ConfigError::invalid_field(
                "models.reasoner",
                "must not be empty when the reasoner is enabled",
            ));
        }
        if self.models.use_polish && self.models.polisher.trim().is_empty() {
            return Err(ConfigError::invalid_field(
                "models.polisher",
                "must not be empty when polishing is enabled",
            ));
        }
        if self.retry.fallback_model.trim().is_empty() {
            return Err(ConfigError::invalid_field(
                "retry.fallback_model",
                "must not be empty",
            ));
        }
        if self.tts.pause_min < 0.0 || self.tts.pause_min > self.tts.pause_max {
            return Err(ConfigError::invalid_field(
                "tts.pause_min",
                "must be non-negative and not exceed tts.pause_max",
            ));
        }
        if self.tts.breathe_every == 0 {
            return Err(ConfigError::invalid_field(
                "tts.breathe_every",
                "must be at least 1",
            ));
        }
        if !(self.destination.arrival_signals_start > 0.0
            && self.destination.arrival_signals_start <= 1.0)
        {
            return Err(ConfigError::invalid_field(
                "destination.arrival_signals_start",
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }

    /// Total words for a story of `duration_minutes`.
    pub fn target_words_for(&self, duration_minutes: u32) -> usize {
        duration_minutes as usize * self.target_wpm as usize
    }

    /// Duration implied by `beats × words_per_beat` at the configured WPM.
    pub fn nominal_duration_minutes(&self) -> u32 {
        let words = self.beats * self.words_per_beat;
        let minutes = words.div_ceil(self.target_wpm.max(1) as usize);
        u32::try_from(minutes.max(1)).unwrap_or(u32::MAX)
    }
}

/// Named bundles of configuration values.
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
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum Preset {
    /// All three stages, twelve long beats
    #[serde(rename = "quality_high")]
    #[strum(serialize = "quality_high")]
    QualityHigh,
    /// Generator only, eight shorter beats
    #[serde(rename = "fast")]
    #[strum(serialize = "fast")]
    Fast,
    /// Six short beats for a five-minute check
    #[serde(rename = "smoke_test_5m")]
    #[strum(serialize = "smoke_test_5m")]
    SmokeTest5m,
    /// Gentlest pacing with an early, deep taper
    #[serde(rename = "ultra_relax")]
    #[strum(serialize = "ultra_relax")]
    UltraRelax,
}

impl Preset {
    /// Short description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            Preset::QualityHigh => "generator, reasoner and polisher; 12 beats of ~600 words",
            Preset::Fast => "generator only; 8 beats of ~400 words",
            Preset::SmokeTest5m => "generator and polisher; 6 beats of ~100 words",
            Preset::UltraRelax => "all stages; tight tolerance and an early, deep taper",
        }
    }

    /// Configuration for this preset.
    pub fn config(&self) -> GenerationConfig {
        let base = GenerationConfig::default();
        match self {
            Preset::QualityHigh => base,
            Preset::Fast => GenerationConfig {
                beats: 8,
                words_per_beat: 400,
                length_tolerance: 0.12,
                models: ModelRoster {
                    use_reasoner: false,
                    use_polish: false,
                    ..ModelRoster::default()
                },
                temperatures: StageTemperatures {
                    generator: 0.65,
                    ..StageTemperatures::default()
                },
                ..base
            },
            Preset::SmokeTest5m => GenerationConfig {
                beats: 6,
                words_per_beat: 100,
                models: ModelRoster {
                    use_reasoner: false,
                    use_polish: true,
                    ..ModelRoster::default()
                },
                temperatures: StageTemperatures {
                    generator: 0.6,
                    reasoner: 0.3,
                    polisher: 0.35,
                },
                taper: TaperConfig {
                    start_fraction: 0.70,
                    reduction: 0.60,
                },
                ..base
            },
            Preset::UltraRelax => GenerationConfig {
                length_tolerance: 0.08,
                temperatures: StageTemperatures {
                    generator: 0.6,
                    reasoner: 0.3,
                    polisher: 0.35,
                },
                taper: TaperConfig {
                    start_fraction: 0.70,
                    reduction: 0.60,
                },
                ..base
            },
        }
    }
}

impl From<Preset> for GenerationConfig {
    fn from(preset: Preset) -> Self {
        preset.config()
    }
}
