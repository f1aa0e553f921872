//! Test utilities for the somnia facade and CLI.

#![allow(dead_code)]

use async_trait::async_trait;
use somnia::{InferenceDriver, SomniaResult};
use somnia_core::{InferenceRequest, InferenceResponse};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Beat text returned for every prompt.
pub const BEAT: &str = "Stanotte ti incammini verso il rifugio nel bosco. Senti sotto i piedi l'erba fresca. Il respiro rallenta mentre raggiungi la radura.";

/// Answers every prompt with [`BEAT`].
#[derive(Debug, Default)]
pub struct FixedDriver {
    calls: AtomicUsize,
}

impl FixedDriver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceDriver for FixedDriver {
    async fn generate(&self, request: &InferenceRequest) -> SomniaResult<InferenceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(InferenceResponse::from_text(request.model().as_str(), BEAT))
    }

    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

/// Small generator-only configuration with no retry delay.
pub const QUICK_CONFIG: &str = r#"
beats = 2
words_per_beat = 40

[models]
use_reasoner = false
use_polish = false

[retry]
delay_ms = 0
"#;

/// Write `content` to a uniquely named file in the temp directory.
pub fn temp_file(name: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("somnia-{}-{}", std::process::id(), name));
    std::fs::write(&path, content)?;
    Ok(path)
}
