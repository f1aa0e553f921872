//! Ollama `/api/generate` driver.

mod client;
mod config;
mod dto;

pub use client::OllamaClient;
pub use config::{DEFAULT_OLLAMA_URL, OllamaConfig};
pub use dto::{
    OllamaGenerateOptions, OllamaGenerateRequest, OllamaGenerateRequestBuilder,
    OllamaGenerateResponse,
};
