//! Tests for retry and fallback around inference calls

mod test_utils;

use somnia_core::InferenceOptions;
use somnia_narrative::{GENERATION_PLACEHOLDER, ResilientClient, RetryPolicy};
use std::sync::Arc;
use test_utils::{FailingDriver, ScriptedDriver};

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay_ms: 0,
        fallback_model: "fallback:1b".to_string(),
    }
}

fn options() -> InferenceOptions {
    InferenceOptions::new(0.7, 200)
}

#[tokio::test]
async fn test_success_after_failures_skips_fallback() {
    let driver = Arc::new(ScriptedDriver::new(vec![None, None, Some("Il sentiero ti accoglie.")]));
    let client = ResilientClient::new(Arc::clone(&driver), policy());

    let completion = client.complete("primary:8b", "Write a beat", options()).await;

    assert_eq!(completion.text, "Il sentiero ti accoglie.");
    assert_eq!(completion.model.as_deref(), Some("primary:8b"));
    assert_eq!(completion.attempts, 3);
    assert!(!completion.used_fallback);
    assert!(!completion.is_degraded());
    assert_eq!(driver.calls(), 3);
    assert!(driver.models().iter().all(|m| m == "primary:8b"));
}

#[tokio::test]
async fn test_first_success_makes_one_call() {
    let driver = Arc::new(ScriptedDriver::new(vec![Some("  subito  ")]));
    let client = ResilientClient::new(Arc::clone(&driver), policy());

    let completion = client.complete("primary:8b", "Write a beat", options()).await;

    assert_eq!(completion.text, "subito");
    assert_eq!(completion.attempts, 1);
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn test_exhausted_primary_makes_exactly_one_fallback_call() {
    let driver = Arc::new(FailingDriver::default());
    let client = ResilientClient::new(Arc::clone(&driver), policy());

    let completion = client.complete("primary:8b", "Write a beat", options()).await;

    assert_eq!(completion.text, GENERATION_PLACEHOLDER);
    assert!(completion.is_degraded());
    assert!(completion.used_fallback);
    assert_eq!(completion.attempts, 4);
    assert_eq!(driver.calls(), 4);

    let models = driver.models();
    assert_eq!(models.iter().filter(|m| *m == "fallback:1b").count(), 1);
    assert_eq!(models.last().map(String::as_str), Some("fallback:1b"));
}

#[tokio::test]
async fn test_fallback_answer_is_used() {
    let driver = Arc::new(ScriptedDriver::new(vec![None, None, None, Some("Dal modello di riserva.")]));
    let client = ResilientClient::new(Arc::clone(&driver), policy());

    let completion = client.complete("primary:8b", "Write a beat", options()).await;

    assert_eq!(completion.text, "Dal modello di riserva.");
    assert_eq!(completion.model.as_deref(), Some("fallback:1b"));
    assert!(completion.used_fallback);
    assert!(!completion.is_degraded());
}

#[tokio::test]
async fn test_blank_answer_counts_as_failure() {
    let driver = Arc::new(ScriptedDriver::new(vec![Some("   "), Some("Ora sì.")]));
    let client = ResilientClient::new(Arc::clone(&driver), policy());

    let completion = client.complete("primary:8b", "Write a beat", options()).await;

    assert_eq!(completion.text, "Ora sì.");
    assert_eq!(completion.attempts, 2);
}
