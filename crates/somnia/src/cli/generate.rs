//! Generate command handler.

use super::GenerateArgs;
use anyhow::Context;
use serde::Serialize;
use somnia_core::{BeatSchema, CoherenceStats, StoryMetrics, StoryRequest, StoryResult};
use somnia_interface::InferenceDriver;
use somnia_narrative::{GenerationConfig, StoryPipelineCoordinator};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, instrument};

/// Machine-readable summary of one run, written as JSON.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    /// Theme the story was generated for.
    pub theme: &'a str,
    /// Human-readable outline.
    pub outline_summary: &'a str,
    /// Run metrics.
    pub metrics: &'a StoryMetrics,
    /// Coherence statistics.
    pub coherence: &'a CoherenceStats,
    /// Per-beat schema, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beats_schema: Option<&'a [BeatSchema]>,
}

impl GenerateArgs {
    /// Configuration for this run.
    ///
    /// Starts from the config file, the preset or the defaults, in that
    /// order, then applies the command-line overrides and validates.
    pub fn generation_config(&self) -> anyhow::Result<GenerationConfig> {
        let mut config = match (&self.config, self.preset) {
            (Some(path), _) => GenerationConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            (None, Some(preset)) => preset.config(),
            (None, None) => GenerationConfig::default(),
        };

        if let Some(beats) = self.beats {
            config.beats = beats;
        }
        if let Some(language) = self.language {
            config.language = language;
        }
        config.validate()?;
        Ok(config)
    }

    /// Story request for this run.
    pub fn story_request(&self) -> StoryRequest {
        StoryRequest {
            theme: self.theme.clone(),
            description: self.description.clone(),
            duration_minutes: self.duration,
            custom_waypoints: if self.waypoints.is_empty() {
                None
            } else {
                Some(self.waypoints.clone())
            },
            seed: self.seed,
            strict_schema: self.strict_schema,
            tts_markers: self.tts_markers,
        }
    }
}

/// Run the pipeline for `args` against `driver`, logging progress.
#[instrument(skip(driver, args), fields(theme = %args.theme, duration = args.duration))]
pub async fn generate_story<D>(driver: Arc<D>, args: &GenerateArgs) -> anyhow::Result<StoryResult>
where
    D: InferenceDriver + ?Sized,
{
    let config = args.generation_config()?;
    info!(
        beats = config.beats,
        language = %config.language,
        generator = %config.models.generator,
        "Configuration loaded"
    );

    let coordinator = StoryPipelineCoordinator::new(driver, config)?;
    let request = args.story_request();
    let progress = |percent: u8, step: &str| info!(percent, step, "Progress");
    let result = coordinator.generate(&request, &progress).await;

    info!(
        words = result.metrics.word_count,
        target = result.metrics.target_words,
        accuracy = result.metrics.accuracy_percent,
        degraded = result.metrics.degraded_beats.len(),
        "Story generated"
    );
    Ok(result)
}

/// Write the story and the metrics report.
///
/// The story goes to `--output` or `stdout`; the report goes to `--metrics`
/// or `stderr`.
pub fn write_outputs(
    result: &StoryResult,
    args: &GenerateArgs,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            std::fs::write(path, &result.story_text)
                .with_context(|| format!("Failed to write story to {}", path.display()))?;
            info!(path = %path.display(), "Story written");
        }
        None => writeln!(stdout, "{}", result.story_text)?,
    }

    let report = RunReport {
        theme: &args.theme,
        outline_summary: &result.outline_summary,
        metrics: &result.metrics,
        coherence: &result.coherence,
        beats_schema: result.beats_schema.as_deref(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &args.metrics {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
            info!(path = %path.display(), "Metrics written");
        }
        None => writeln!(stderr, "{}", json)?,
    }
    Ok(())
}

/// Handles the generate command against the Ollama server from the environment.
#[cfg(feature = "ollama")]
pub async fn handle_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let driver = Arc::new(somnia_models::OllamaClient::from_env()?);
    info!(url = %driver.config().base_url, "Using Ollama server");

    let result = generate_story(driver, &args).await?;
    write_outputs(
        &result,
        &args,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )
}
