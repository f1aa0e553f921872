//! Tests for the Ollama driver.
//!
//! Tests marked `#[ignore]` need a running Ollama server with the model
//! pulled. Run with: cargo test --package somnia_models --features api -- --ignored

use somnia_core::{InferenceOptions, InferenceRequest};
use somnia_interface::InferenceDriver;
use somnia_models::{OllamaClient, OllamaConfig, OllamaGenerateOptions, OllamaGenerateRequest};

#[test]
fn test_generate_request_serializes_non_streaming_body() -> anyhow::Result<()> {
    let options = InferenceOptions {
        temperature: 0.5,
        max_output_tokens: 120,
        repetition_penalty: Some(1.1),
    };
    let request = OllamaGenerateRequest::builder()
        .model("qwen3:8b")
        .prompt("Describe a meadow.")
        .options(OllamaGenerateOptions::from(&options))
        .build()?;

    let json = serde_json::to_value(&request)?;
    assert_eq!(json["model"], "qwen3:8b");
    assert_eq!(json["stream"], false);
    assert_eq!(json["options"]["num_predict"], 120);
    assert!((json["options"]["repeat_penalty"].as_f64().unwrap_or_default() - 1.1).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_repeat_penalty_omitted_when_unset() -> anyhow::Result<()> {
    let options = OllamaGenerateOptions::from(&InferenceOptions::new(0.7, 50));
    let json = serde_json::to_value(options)?;
    assert!(json.get("repeat_penalty").is_none());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_retryable_error() -> anyhow::Result<()> {
    let client = OllamaClient::new(OllamaConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
    })?;
    let request = InferenceRequest::builder()
        .model("qwen3:8b")
        .prompt("hello")
        .build()?;

    let result = client.generate(&request).await;
    let err = result.err().ok_or_else(|| anyhow::anyhow!("expected an error"))?;
    assert!(err.is_retryable());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_ollama_basic_generation() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let client = OllamaClient::from_env()?;
    let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string());
    let request = InferenceRequest::builder()
        .model(model)
        .prompt("Say hello in one short sentence.")
        .options(InferenceOptions::new(0.2, 40))
        .build()?;

    let response = client.generate(&request).await?;
    assert!(!response.text.is_empty());
    Ok(())
}
