//! Inference service error types.

use derive_more::{Display, Error};

/// Specific error conditions when calling an inference service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum InferenceErrorKind {
    /// The request never reached the service or the connection dropped.
    #[display("Transport failure: {}", _0)]
    Transport(String),

    /// The service answered with a non-success status.
    #[display("Service returned status {}: {}", status, message)]
    Status {
        /// HTTP status code
        status: u16,
        /// Body or reason returned by the service
        message: String,
    },

    /// The service answered successfully but produced no text.
    #[display("Empty response from model '{}'", _0)]
    EmptyResponse(String),

    /// The response body could not be decoded.
    #[display("Malformed response: {}", _0)]
    Malformed(String),

    /// The request could not be assembled.
    #[display("Invalid request: {}", _0)]
    Builder(String),
}

impl InferenceErrorKind {
    /// Whether the failure is worth another attempt.
    ///
    /// Everything the service or the network can cause is retryable; a request
    /// that could not even be built will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, InferenceErrorKind::Builder(_))
    }
}

/// Inference error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Inference Error: {} at line {} in {}", kind, line, file)]
pub struct InferenceError {
    /// The specific error kind.
    pub kind: InferenceErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// File where error occurred.
    pub file: &'static str,
}

impl InferenceError {
    /// Creates a new error with automatic location tracking.
    ///
    /// # Examples
    ///
    /// ```
    /// use somnia_error::{InferenceError, InferenceErrorKind};
    ///
    /// let err = InferenceError::new(InferenceErrorKind::EmptyResponse("qwen3:8b".into()));
    /// assert!(err.kind.is_retryable());
    /// assert!(err.to_string().contains("qwen3:8b"));
    /// ```
    #[track_caller]
    pub fn new(kind: InferenceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
