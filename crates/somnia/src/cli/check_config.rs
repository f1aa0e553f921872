//! Config validation command handler.

use anyhow::Context;
use somnia_narrative::GenerationConfig;
use std::io::Write;
use std::path::Path;

/// Loads and validates a configuration file, then prints what it resolves to.
#[tracing::instrument(skip(out), fields(path = %path.display()))]
pub fn handle_check_config(path: &Path, out: &mut impl Write) -> anyhow::Result<GenerationConfig> {
    let config = GenerationConfig::from_file(path)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    tracing::info!("Configuration valid");

    let models = &config.models;
    writeln!(out, "✅ {} is valid", path.display())?;
    writeln!(out, "  Language:        {}", config.language)?;
    writeln!(
        out,
        "  Beats:           {} x {} words (~{} min at {} wpm)",
        config.beats,
        config.words_per_beat,
        config.nominal_duration_minutes(),
        config.target_wpm
    )?;
    writeln!(out, "  Generator:       {}", models.generator)?;
    writeln!(
        out,
        "  Reasoner:        {}{}",
        models.reasoner,
        if models.use_reasoner { "" } else { " (disabled)" }
    )?;
    writeln!(
        out,
        "  Polisher:        {}{}",
        models.polisher,
        if models.use_polish { "" } else { " (disabled)" }
    )?;
    writeln!(
        out,
        "  Taper:           from {:.0}% at {:.0}% density",
        config.taper.start_fraction * 100.0,
        config.taper.reduction * 100.0
    )?;
    writeln!(out, "  TTS markers:     {}", config.tts.markers)?;
    Ok(config)
}
