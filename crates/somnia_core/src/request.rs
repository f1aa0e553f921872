//! Request and response types for inference calls.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Sampling options for one inference call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Optional repetition penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
}

impl InferenceOptions {
    /// Options with the given temperature and token budget, no penalty.
    pub fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
            repetition_penalty: None,
        }
    }
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self::new(0.7, 800)
    }
}

/// A single-prompt generation request against a named model.
///
/// # Examples
///
/// ```
/// use somnia_core::{InferenceOptions, InferenceRequest};
///
/// let request = InferenceRequest::builder()
///     .model("qwen3:8b")
///     .prompt("Describe a quiet meadow.")
///     .options(InferenceOptions::new(0.4, 200))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.model(), "qwen3:8b");
/// assert_eq!(request.options().max_output_tokens, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct InferenceRequest {
    /// Model identifier
    model: String,
    /// Full prompt text
    prompt: String,
    /// Sampling options
    #[builder(default)]
    options: InferenceOptions,
}

impl InferenceRequest {
    /// Creates a new builder for InferenceRequest.
    pub fn builder() -> InferenceRequestBuilder {
        InferenceRequestBuilder::default()
    }
}

/// Text returned by the inference service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Generated text.
    pub text: String,
    /// Model that actually answered.
    pub model: String,
    /// Prompt tokens evaluated, when reported.
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    /// Tokens generated, when reported.
    #[serde(default)]
    pub completion_tokens: Option<u32>,
}

impl InferenceResponse {
    /// Response carrying only text.
    pub fn from_text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }
}
