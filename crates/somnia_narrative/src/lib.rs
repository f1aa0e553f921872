//! Beat-level sleep-story generation for Somnia.
//!
//! This crate turns a theme into a finished sleep story. The
//! [`StoryPipelineCoordinator`] analyzes the theme, plans an outline and then
//! generates the story one beat at a time through a [`StagePipeline`]
//! (generate → reason → polish). Around the pipeline sit the quality
//! controls:
//!
//! - [`WordBudgetScheduler`] splits the duration's word budget into tapered
//!   per-beat targets
//! - [`RepetitionGuard`] fingerprints beats and forbids worn-out openers
//! - [`NarrativeMemory`] keeps continuity and scores coherence
//! - [`EmbodimentValidator`] and [`DestinationValidator`] check the finished
//!   beats and drive one bounded corrective pass
//!
//! # Example
//!
//! ```no_run
//! use somnia_narrative::{GenerationConfig, StoryPipelineCoordinator};
//! use somnia_core::StoryRequest;
//! use somnia_interface::{InferenceDriver, NoProgress};
//! use std::sync::Arc;
//!
//! # async fn run(driver: Arc<dyn InferenceDriver>) -> somnia_error::SomniaResult<()> {
//! let coordinator = StoryPipelineCoordinator::new(driver, GenerationConfig::default())?;
//! let request = StoryRequest::builder().theme("tranquil forest").duration_minutes(10).build();
//! let result = coordinator.generate(&request, &NoProgress).await;
//! println!("{}", result.story_text);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod assembly;
mod config;
mod coordinator;
mod critique;
mod destination;
mod detectors;
mod embodiment;
mod jobs;
mod length;
mod memory;
mod outline;
mod pipeline;
mod prompts;
mod repetition;
mod retry;
mod scheduler;

pub use assembly::{
    BREATHE_MARKER, assemble_story, build_schema, final_polish, insert_breaths, pause_marker,
    pause_schedule, render_beats, strip_markers,
};
pub use config::{
    DestinationConfig, EmbodimentRequirements, GenerationConfig, ModelRoster, NarrationLanguage,
    Preset, RetryPolicy, StageTemperatures, TaperConfig, TtsConfig,
};
pub use coordinator::StoryPipelineCoordinator;
pub use critique::{Critique, CritiqueLexicon, HeuristicCritic};
pub use destination::{
    ArcPhase, DestinationArchetype, DestinationPhase, DestinationReport, DestinationValidator,
    beat_for_phase, select_destination,
};
pub use detectors::{
    AllOf, DestinationLexicon, Detector, EmbodimentLexicon, KeywordDetector, SecondPersonDetector,
};
pub use embodiment::{
    EMBODIMENT_PASS_SCORE, EmbodimentChecks, EmbodimentReport, EmbodimentValidator,
};
pub use jobs::{InMemoryJobStore, JobTicket, StoryJobRunner};
pub use length::enforce_length;
pub use memory::{
    CONTEXT_WINDOW, CheckOutcome, CoherenceReport, EntityTracker, MemoryStats, NarrativeMemory,
    StyleSample, jaccard,
};
pub use outline::{
    OutlinePlanner, extract_json, fallback_outline, normalize_outline, parse_model_json,
};
pub use pipeline::{PipelineCheckpoint, StagePipeline};
pub use prompts::{
    BeatPrompt, FALLBACK_SPATIAL_BRIEF, OUTLINE_REPAIR_PROMPT, THEME_REPAIR_PROMPT,
    correction_prompt, format_action_style, format_downshift_requirements,
    format_generation_parameters, format_perception_requirements, format_style_requirements,
    format_transition_requirements, outline_prompt, polisher_prompt, reasoner_prompt,
    spatial_coach_prompt, theme_analysis_prompt,
};
pub use repetition::{BeatFingerprint, RepetitionGuard, RepetitionLexicon, UniqueElements};
pub use retry::{Completion, GENERATION_PLACEHOLDER, ResilientClient};
pub use scheduler::{GENTLE_OPENERS, OPENER_DENYLIST, WordBudgetScheduler, vary_opener};
