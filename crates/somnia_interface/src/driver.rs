//! Inference driver trait.

use async_trait::async_trait;
use somnia_core::{InferenceRequest, InferenceResponse};
use somnia_error::SomniaResult;

/// A backend able to complete a single prompt.
///
/// Implementations must be cheap to share behind an `Arc`: the pipeline holds
/// one driver for the whole run and issues at most one call at a time.
#[async_trait]
pub trait InferenceDriver: Send + Sync {
    /// Complete the request and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached, answers with a
    /// failure status, or returns a body that cannot be decoded.
    async fn generate(&self, request: &InferenceRequest) -> SomniaResult<InferenceResponse>;

    /// Provider name used in logs.
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T> InferenceDriver for std::sync::Arc<T>
where
    T: InferenceDriver + ?Sized,
{
    async fn generate(&self, request: &InferenceRequest) -> SomniaResult<InferenceResponse> {
        (**self).generate(request).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}
