//! Trait definitions for the Somnia sleep-story generator.
//!
//! The generation core only talks to the outside world through the seams
//! defined here: an [`InferenceDriver`] for model calls, a [`ProgressSink`]
//! for milestone reporting and a [`JobStore`] for run bookkeeping.

mod driver;
mod jobs;
mod progress;

pub use driver::InferenceDriver;
pub use jobs::{JobId, JobRecord, JobStatus, JobStore};
pub use progress::{NoProgress, ProgressSink};
