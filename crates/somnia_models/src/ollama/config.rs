//! Connection settings for an Ollama server.

use serde::{Deserialize, Serialize};
use somnia_error::{ConfigError, SomniaResult};
use std::time::Duration;

/// Default server address.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Where the server lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_URL` and `OLLAMA_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `OLLAMA_TIMEOUT_SECS` is set but is
    /// not a positive integer.
    pub fn from_env() -> SomniaResult<Self> {
        let base_url = std::env::var("OLLAMA_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());

        let timeout_secs = match std::env::var("OLLAMA_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::invalid_field(
                        "OLLAMA_TIMEOUT_SECS",
                        format!("must be a positive integer, got '{}'", raw),
                    )
                    .into());
                }
            },
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            timeout_secs,
        })
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the generate endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}
