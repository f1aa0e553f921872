//! Inference drivers for the Somnia sleep-story generator.
//!
//! Each driver implements [`somnia_interface::InferenceDriver`]. The only
//! backend shipped today is a local Ollama server.

#[cfg(feature = "ollama")]
mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::{
    DEFAULT_OLLAMA_URL, OllamaClient, OllamaConfig, OllamaGenerateOptions, OllamaGenerateRequest,
    OllamaGenerateRequestBuilder, OllamaGenerateResponse,
};
