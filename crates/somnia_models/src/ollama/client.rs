//! HTTP client for a local Ollama server.

use crate::ollama::{OllamaConfig, OllamaGenerateOptions, OllamaGenerateRequest, OllamaGenerateResponse};
use async_trait::async_trait;
use reqwest::Client;
use somnia_core::{InferenceRequest, InferenceResponse};
use somnia_error::{HttpError, InferenceError, InferenceErrorKind, SomniaResult};
use somnia_interface::InferenceDriver;
use tracing::{debug, error, instrument};

/// Driver for Ollama's non-streaming `/api/generate` endpoint.
///
/// The model is chosen per request, so one client serves the generator,
/// reasoner, polisher and fallback models alike.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Creates a client for the given server settings.
    ///
    /// # Errors
    ///
    /// Returns an HTTP error if the underlying client cannot be built.
    #[instrument(fields(url = %config.base_url, timeout_secs = config.timeout_secs))]
    pub fn new(config: OllamaConfig) -> SomniaResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;

        debug!(url = %config.base_url, "Created Ollama client");

        Ok(Self { client, config })
    }

    /// Creates a client configured from the environment.
    ///
    /// # Errors
    ///
    /// Fails when the environment holds an invalid timeout or the HTTP client
    /// cannot be built.
    pub fn from_env() -> SomniaResult<Self> {
        Self::new(OllamaConfig::from_env()?)
    }

    /// Server settings in use.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn to_wire(request: &InferenceRequest) -> SomniaResult<OllamaGenerateRequest> {
        OllamaGenerateRequest::builder()
            .model(request.model().clone())
            .prompt(request.prompt().clone())
            .stream(false)
            .options(OllamaGenerateOptions::from(request.options()))
            .build()
            .map_err(|e| InferenceError::new(InferenceErrorKind::Builder(e.to_string())).into())
    }
}

#[async_trait]
impl InferenceDriver for OllamaClient {
    #[instrument(skip(self, request), fields(model = %request.model(), prompt_chars = request.prompt().len()))]
    async fn generate(&self, request: &InferenceRequest) -> SomniaResult<InferenceResponse> {
        let body = Self::to_wire(request)?;

        debug!(
            model = %request.model(),
            temperature = request.options().temperature,
            num_predict = request.options().max_output_tokens,
            "Sending generate request"
        );

        let response = self
            .client
            .post(self.config.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %request.model(), error = ?e, "HTTP request failed");
                InferenceError::new(InferenceErrorKind::Transport(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                model = %request.model(),
                status = %status,
                error = %error_text,
                "Ollama returned an error"
            );
            return Err(InferenceError::new(InferenceErrorKind::Status {
                status: status.as_u16(),
                message: error_text,
            })
            .into());
        }

        let parsed: OllamaGenerateResponse = response.json().await.map_err(|e| {
            error!(model = %request.model(), error = ?e, "Failed to parse response");
            InferenceError::new(InferenceErrorKind::Malformed(e.to_string()))
        })?;

        let text = parsed.response.trim().to_string();
        if text.is_empty() {
            return Err(InferenceError::new(InferenceErrorKind::EmptyResponse(
                request.model().clone(),
            ))
            .into());
        }

        debug!(
            model = %request.model(),
            completion_tokens = ?parsed.eval_count,
            chars = text.len(),
            "Received response"
        );

        let model = if parsed.model.is_empty() {
            request.model().clone()
        } else {
            parsed.model
        };

        Ok(InferenceResponse {
            text,
            model,
            prompt_tokens: parsed.prompt_eval_count,
            completion_tokens: parsed.eval_count,
        })
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}
