//! Job store error types.

use derive_more::{Display, Error};

/// Specific error conditions for job store operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum JobErrorKind {
    /// No job with the given identifier exists.
    #[display("Job {} not found", _0)]
    NotFound(String),

    /// The requested status change is not allowed from the current status.
    #[display("Job {} cannot move from {} to {}", id, from, to)]
    InvalidTransition {
        /// Job identifier
        id: String,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
}

/// Job store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Job Error: {} at line {} in {}", kind, line, file)]
pub struct JobError {
    kind: JobErrorKind,
    line: u32,
    file: &'static str,
}

impl JobError {
    /// Create a new job error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: JobErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &JobErrorKind {
        &self.kind
    }
}

impl<T> From<T> for JobError
where
    T: Into<JobErrorKind>,
{
    #[track_caller]
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
