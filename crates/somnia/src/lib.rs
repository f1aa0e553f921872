//! Somnia: sleep stories from local language models.
//!
//! This crate is the facade over the workspace. It re-exports the data types,
//! the traits at the seams, the generation core and (with the `ollama`
//! feature) the Ollama driver, and hosts the `somnia` command-line tool.
//!
//! ```no_run
//! use somnia::{GenerationConfig, NoProgress, OllamaClient, StoryPipelineCoordinator, StoryRequest};
//! use std::sync::Arc;
//!
//! # async fn run() -> somnia::SomniaResult<()> {
//! let driver = Arc::new(OllamaClient::from_env()?);
//! let coordinator = StoryPipelineCoordinator::new(driver, GenerationConfig::default())?;
//! let request = StoryRequest::builder().theme("quiet harbour").duration_minutes(20).build();
//! let story = coordinator.generate(&request, &NoProgress).await;
//! println!("{}", story.story_text);
//! # Ok(())
//! # }
//! ```

pub mod cli;

pub use somnia_core::{
    Beat, BeatSchema, CoherenceStats, MediaCues, Outline, OutlineAct, OutlineBeat,
    PipelineMetrics, SensoryMode, StoryBible, StoryMetrics, StoryRequest, StoryResult,
    ThemeAnalysis, word_count,
};
pub use somnia_error::{SomniaError, SomniaErrorKind, SomniaResult};
pub use somnia_interface::{
    InferenceDriver, JobId, JobRecord, JobStatus, JobStore, NoProgress, ProgressSink,
};
pub use somnia_narrative::{
    GenerationConfig, InMemoryJobStore, NarrationLanguage, Preset, StoryJobRunner,
    StoryPipelineCoordinator,
};

#[cfg(feature = "ollama")]
pub use somnia_models::{OllamaClient, OllamaConfig};
