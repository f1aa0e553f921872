//! Core data types for the Somnia sleep-story generator.
//!
//! This crate provides the data shared between the generation core, the
//! inference drivers and the outer surfaces (CLI, job runner).

mod beat;
mod bible;
mod metrics;
mod outline;
mod request;
mod result;
mod sensory;
mod text;

pub use beat::{Beat, BeatPlan, StageWordCounts};
pub use bible::StoryBible;
pub use metrics::{CoherenceStats, PipelineMetrics, StoryMetrics};
pub use outline::{Outline, OutlineAct, OutlineBeat, ThemeAnalysis};
pub use request::{
    InferenceOptions, InferenceRequest, InferenceRequestBuilder, InferenceRequestBuilderError,
    InferenceResponse,
};
pub use result::{BeatSchema, MediaCues, StoryRequest, StoryResult};
pub use sensory::SensoryMode;
pub use text::{split_sentences, word_count};
