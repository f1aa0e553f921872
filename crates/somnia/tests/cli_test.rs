//! Tests for command-line parsing and the command handlers

mod test_utils;

use clap::Parser;
use somnia::cli::{
    Cli, Commands, GenerateArgs, generate_story, handle_check_config, handle_presets,
    write_outputs,
};
use somnia::{NarrationLanguage, Preset};
use std::sync::Arc;
use test_utils::{FixedDriver, QUICK_CONFIG, temp_file};

fn generate_args(argv: &[&str]) -> GenerateArgs {
    let cli = Cli::try_parse_from(argv).unwrap();
    match cli.command {
        Commands::Generate(args) => args,
        other => panic!("expected generate, got {:?}", other),
    }
}

#[test]
fn test_parse_generate() {
    let args = generate_args(&[
        "somnia",
        "generate",
        "--theme",
        "quiet lake",
        "--preset",
        "fast",
        "--duration",
        "20",
        "--waypoint",
        "ponte",
        "--waypoint",
        "lago",
        "--tts-markers",
    ]);

    assert_eq!(args.theme, "quiet lake");
    assert_eq!(args.preset, Some(Preset::Fast));
    assert_eq!(args.duration, 20);
    assert!(args.tts_markers);
    assert!(!args.strict_schema);

    let request = args.story_request();
    assert_eq!(request.duration_minutes, 20);
    assert_eq!(
        request.custom_waypoints,
        Some(vec!["ponte".to_string(), "lago".to_string()])
    );
    assert!(request.tts_markers);
}

#[test]
fn test_generate_defaults() {
    let args = generate_args(&["somnia", "generate", "-t", "forest"]);
    assert_eq!(args.duration, 45);
    assert!(args.story_request().custom_waypoints.is_none());

    let config = args.generation_config().unwrap();
    assert_eq!(config.beats, 12);
}

#[test]
fn test_preset_and_config_conflict() {
    let parsed = Cli::try_parse_from([
        "somnia", "generate", "--theme", "lake", "--preset", "fast", "--config", "a.toml",
    ]);
    assert!(parsed.is_err());
}

#[test]
fn test_unknown_preset_is_rejected() {
    assert!(Cli::try_parse_from(["somnia", "generate", "--theme", "lake", "--preset", "turbo"]).is_err());
}

#[test]
fn test_overrides_apply_on_top_of_preset() {
    let args = generate_args(&[
        "somnia",
        "generate",
        "--theme",
        "lake",
        "--preset",
        "fast",
        "--beats",
        "3",
        "--language",
        "english",
    ]);
    let config = args.generation_config().unwrap();
    assert_eq!(config.beats, 3);
    assert_eq!(config.language, NarrationLanguage::English);
    assert!(!config.models.use_reasoner);
}

#[test]
fn test_invalid_override_is_rejected() {
    let args = generate_args(&["somnia", "generate", "--theme", "lake", "--beats", "0"]);
    assert!(args.generation_config().is_err());
}

#[test]
fn test_parse_check_config() {
    let cli = Cli::try_parse_from(["somnia", "--json-logs", "check-config", "story.toml"]).unwrap();
    assert!(cli.json_logs);
    assert!(matches!(cli.command, Commands::CheckConfig { path } if path.ends_with("story.toml")));
}

#[test]
fn test_presets_listing() {
    let mut out = Vec::new();
    handle_presets(&mut out).unwrap();
    let listing = String::from_utf8(out).unwrap();
    for name in ["quality_high", "fast", "smoke_test_5m", "ultra_relax"] {
        assert!(listing.contains(name), "{}", listing);
    }
}

#[test]
fn test_check_config() -> anyhow::Result<()> {
    let path = temp_file("check.toml", QUICK_CONFIG)?;
    let mut out = Vec::new();
    let config = handle_check_config(&path, &mut out)?;
    let report = String::from_utf8(out)?;

    assert_eq!(config.beats, 2);
    assert!(report.contains("is valid"));
    assert!(report.contains("(disabled)"));

    std::fs::write(&path, "beats = 0")?;
    let error = handle_check_config(&path, &mut Vec::new()).unwrap_err();
    assert!(format!("{:#}", error).contains("beats"), "{:#}", error);

    std::fs::remove_file(&path)?;
    Ok(())
}

#[tokio::test]
async fn test_generate_writes_story_and_report() -> anyhow::Result<()> {
    let config = temp_file("generate.toml", QUICK_CONFIG)?;
    let config_arg = config.to_string_lossy().into_owned();
    let args = generate_args(&[
        "somnia",
        "generate",
        "--theme",
        "tranquil forest",
        "--duration",
        "1",
        "--config",
        &config_arg,
        "--strict-schema",
        "--seed",
        "7",
    ]);

    let driver = Arc::new(FixedDriver::default());
    let result = generate_story(Arc::clone(&driver), &args).await?;
    assert_eq!(result.metrics.beats_generated, 2);
    assert!(driver.calls() > 2);

    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    write_outputs(&result, &args, &mut stdout, &mut stderr)?;

    let story = String::from_utf8(stdout)?;
    assert_eq!(story, format!("{}\n", result.story_text));

    let report: serde_json::Value = serde_json::from_slice(&stderr)?;
    assert_eq!(report["theme"], "tranquil forest");
    assert_eq!(report["metrics"]["beats_generated"], 2);
    assert_eq!(report["beats_schema"].as_array().map(Vec::len), Some(2));

    std::fs::remove_file(&config)?;
    Ok(())
}

#[tokio::test]
async fn test_generate_writes_files() -> anyhow::Result<()> {
    let config = temp_file("files.toml", QUICK_CONFIG)?;
    let story_path = std::env::temp_dir().join(format!("somnia-{}-story.txt", std::process::id()));
    let metrics_path =
        std::env::temp_dir().join(format!("somnia-{}-metrics.json", std::process::id()));
    let (config_arg, story_arg, metrics_arg) = (
        config.to_string_lossy().into_owned(),
        story_path.to_string_lossy().into_owned(),
        metrics_path.to_string_lossy().into_owned(),
    );
    let args = generate_args(&[
        "somnia",
        "generate",
        "--theme",
        "harbour",
        "--duration",
        "1",
        "--config",
        &config_arg,
        "--output",
        &story_arg,
        "--metrics",
        &metrics_arg,
    ]);

    let result = generate_story(Arc::new(FixedDriver::default()), &args).await?;
    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    write_outputs(&result, &args, &mut stdout, &mut stderr)?;

    assert!(stdout.is_empty());
    assert!(stderr.is_empty());
    assert_eq!(std::fs::read_to_string(&story_path)?, result.story_text);
    let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&metrics_path)?)?;
    assert!(report.get("beats_schema").is_none());

    for path in [config, story_path, metrics_path] {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
