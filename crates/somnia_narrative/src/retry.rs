//! Retry with a fixed delay, a single fallback call and a placeholder.

use crate::RetryPolicy;
use somnia_core::{InferenceOptions, InferenceRequest};
use somnia_error::{InferenceError, InferenceErrorKind, SomniaError, SomniaResult};
use somnia_interface::InferenceDriver;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Text returned when every attempt, including the fallback, failed.
pub const GENERATION_PLACEHOLDER: &str = "GENERATION_PLACEHOLDER";

/// Text produced by a resilient call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text, or [`GENERATION_PLACEHOLDER`]
    pub text: String,
    /// Model that produced the text, if any did
    pub model: Option<String>,
    /// Calls made, fallback included
    pub attempts: usize,
    /// Whether the fallback model produced the text
    pub used_fallback: bool,
}

impl Completion {
    /// Whether the text is the placeholder.
    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }
}

/// Wraps a driver so that a call never fails.
///
/// The primary model is tried up to `max_attempts` times with a fixed delay
/// between attempts, then the fallback model exactly once, and finally the
/// placeholder is returned. Empty responses count as failures.
#[derive(Debug)]
pub struct ResilientClient<D: ?Sized> {
    driver: Arc<D>,
    policy: RetryPolicy,
}

impl<D: ?Sized> Clone for ResilientClient<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            policy: self.policy.clone(),
        }
    }
}

impl<D> ResilientClient<D>
where
    D: InferenceDriver + ?Sized,
{
    /// Client over `driver` with `policy`.
    pub fn new(driver: Arc<D>, policy: RetryPolicy) -> Self {
        Self { driver, policy }
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Complete `prompt` on `model`, degrading to the placeholder on failure.
    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.len()))]
    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: InferenceOptions,
    ) -> Completion {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            attempts += 1;
            match self.call(model, prompt, options).await {
                Ok(text) => {
                    if attempt > 1 {
                        debug!(attempt, model, "Call succeeded after retry");
                    }
                    return Completion {
                        text,
                        model: Some(model.to_string()),
                        attempts,
                        used_fallback: false,
                    };
                }
                Err(e) => {
                    warn!(attempt, model, error = %e, "Inference attempt failed");
                    if attempt < max_attempts {
                        sleep(self.policy.delay()).await;
                    }
                }
            }
        }

        let fallback = self.policy.fallback_model.as_str();
        warn!(model, fallback, "Primary model exhausted, trying fallback");
        attempts += 1;
        match self.call(fallback, prompt, options).await {
            Ok(text) => Completion {
                text,
                model: Some(fallback.to_string()),
                attempts,
                used_fallback: true,
            },
            Err(e) => {
                error!(model, fallback, error = %e, "Fallback failed, returning placeholder");
                Completion {
                    text: GENERATION_PLACEHOLDER.to_string(),
                    model: None,
                    attempts,
                    used_fallback: true,
                }
            }
        }
    }

    async fn call(
        &self,
        model: &str,
        prompt: &str,
        options: InferenceOptions,
    ) -> SomniaResult<String> {
        let request = InferenceRequest::builder()
            .model(model)
            .prompt(prompt)
            .options(options)
            .build()
            .map_err(|e| {
                SomniaError::from(InferenceError::new(InferenceErrorKind::Builder(
                    e.to_string(),
                )))
            })?;

        let response = self.driver.generate(&request).await?;
        let text = response.text.trim();
        if text.is_empty() {
            return Err(InferenceError::new(InferenceErrorKind::EmptyResponse(model.to_string())).into());
        }
        Ok(text.to_string())
    }
}
