//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use somnia_narrative::{NarrationLanguage, Preset};
use std::path::PathBuf;

/// Sleep stories from local language models.
#[derive(Parser, Debug)]
#[command(name = "somnia")]
#[command(about = "Somnia - beat-level sleep-story generation")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a sleep story
    Generate(GenerateArgs),

    /// List the named configuration presets
    Presets,

    /// Validate a TOML configuration file
    CheckConfig {
        /// Path to the configuration file
        path: PathBuf,
    },
}

/// Arguments for `somnia generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Story theme, e.g. "tranquil forest"
    #[arg(short, long)]
    pub theme: String,

    /// Longer description of the setting
    #[arg(long)]
    pub description: Option<String>,

    /// Target narration length in minutes
    #[arg(short, long, default_value_t = 45)]
    pub duration: u32,

    /// Named preset to start from
    #[arg(short, long, conflicts_with = "config")]
    pub preset: Option<Preset>,

    /// TOML configuration file to start from
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the number of beats
    #[arg(long)]
    pub beats: Option<usize>,

    /// Override the narration language
    #[arg(long)]
    pub language: Option<NarrationLanguage>,

    /// Seed for reproducible phrase selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Waypoint to visit, repeatable; replaces the extracted waypoints
    #[arg(long = "waypoint")]
    pub waypoints: Vec<String>,

    /// Keep pause and breath markers for text-to-speech
    #[arg(long)]
    pub tts_markers: bool,

    /// Include the per-beat schema in the metrics report
    #[arg(long)]
    pub strict_schema: bool,

    /// Write the story here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the metrics report here instead of stderr
    #[arg(long)]
    pub metrics: Option<PathBuf>,
}
