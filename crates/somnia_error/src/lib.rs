//! Error types for the Somnia sleep-story generator.
//!
//! Every error records the source location where it was raised. Crate-level
//! failures are funnelled through [`SomniaError`], which boxes a
//! [`SomniaErrorKind`] so results stay small on the happy path.

mod config;
mod http;
mod inference;
mod job;
mod json;

pub use config::ConfigError;
pub use http::HttpError;
pub use inference::{InferenceError, InferenceErrorKind};
pub use job::{JobError, JobErrorKind};
pub use json::JsonError;

/// Crate-level error variants.
#[derive(Debug, derive_more::From)]
pub enum SomniaErrorKind {
    /// HTTP error
    Http(HttpError),
    /// JSON serialization/deserialization error
    Json(JsonError),
    /// Configuration error
    Config(ConfigError),
    /// Inference service error
    Inference(InferenceError),
    /// Job store error
    Job(JobError),
}

impl std::fmt::Display for SomniaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SomniaErrorKind::Http(e) => write!(f, "{}", e),
            SomniaErrorKind::Json(e) => write!(f, "{}", e),
            SomniaErrorKind::Config(e) => write!(f, "{}", e),
            SomniaErrorKind::Inference(e) => write!(f, "{}", e),
            SomniaErrorKind::Job(e) => write!(f, "{}", e),
        }
    }
}

/// Somnia error with kind discrimination.
#[derive(Debug)]
pub struct SomniaError(Box<SomniaErrorKind>);

impl SomniaError {
    /// Create a new error from a kind.
    pub fn new(kind: SomniaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SomniaErrorKind {
        &self.0
    }

    /// Whether another attempt at the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            SomniaErrorKind::Inference(e) => e.kind.is_retryable(),
            SomniaErrorKind::Http(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SomniaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Somnia Error: {}", self.0)
    }
}

impl std::error::Error for SomniaError {}

// Generic From implementation for any type that converts to SomniaErrorKind
impl<T> From<T> for SomniaError
where
    T: Into<SomniaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Somnia operations.
pub type SomniaResult<T> = std::result::Result<T, SomniaError>;
