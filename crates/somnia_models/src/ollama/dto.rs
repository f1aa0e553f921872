//! Wire types for the Ollama generate endpoint.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use somnia_core::InferenceOptions;

/// Sampling options understood by Ollama.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OllamaGenerateOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub num_predict: u32,
    /// Repetition penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
}

impl From<&InferenceOptions> for OllamaGenerateOptions {
    fn from(options: &InferenceOptions) -> Self {
        Self {
            temperature: options.temperature,
            num_predict: options.max_output_tokens,
            repeat_penalty: options.repetition_penalty,
        }
    }
}

/// Non-streaming generate request.
#[derive(Debug, Clone, Serialize, Builder, Getters)]
#[builder(setter(into))]
pub struct OllamaGenerateRequest {
    /// Model identifier
    model: String,
    /// Prompt text
    prompt: String,
    /// Always false; the driver reads a single JSON body
    #[builder(default)]
    stream: bool,
    /// Sampling options
    options: OllamaGenerateOptions,
}

impl OllamaGenerateRequest {
    /// Creates a new builder for OllamaGenerateRequest.
    pub fn builder() -> OllamaGenerateRequestBuilder {
        OllamaGenerateRequestBuilder::default()
    }
}

/// Generate response body.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaGenerateResponse {
    /// Model that answered
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether generation finished
    #[serde(default)]
    pub done: bool,
    /// Prompt tokens evaluated
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    /// Tokens generated
    #[serde(default)]
    pub eval_count: Option<u32>,
}
