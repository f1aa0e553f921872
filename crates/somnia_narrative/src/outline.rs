//! Theme analysis and outline generation.
//!
//! Both calls ask the generator model for JSON. Answers are pulled out of
//! code fences or brace spans, validated by deserialization and retried with
//! a shorter repair prompt; when every attempt fails a structurally valid
//! default is used so the run can continue.

use crate::prompts::{OUTLINE_REPAIR_PROMPT, THEME_REPAIR_PROMPT, outline_prompt, theme_analysis_prompt};
use crate::{GenerationConfig, ResilientClient};
use serde::de::DeserializeOwned;
use somnia_core::{InferenceOptions, Outline, OutlineAct, OutlineBeat, StoryBible, ThemeAnalysis};
use somnia_error::{JsonError, SomniaResult};
use somnia_interface::InferenceDriver;
use tracing::{debug, info, instrument, warn};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";
const ACT_TITLES: [&str; 3] = ["Arrival", "Exploration", "Rest"];

/// Pull the JSON payload out of a model answer.
///
/// Looks for a ```` ```json ```` fence, then any fence, then the span from
/// the first `{` to the last `}`; otherwise returns the trimmed text.
///
/// # Examples
///
/// ```
/// use somnia_narrative::extract_json;
///
/// assert_eq!(extract_json("Sure!\n```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(extract_json("Here: {\"a\": {\"b\": 2}} done"), "{\"a\": {\"b\": 2}}");
/// ```
pub fn extract_json(text: &str) -> &str {
    if let Some(inner) = fenced(text, JSON_FENCE) {
        return inner;
    }
    if let Some(inner) = fenced(text, FENCE) {
        return inner;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text.trim(),
    }
}

fn fenced<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let end = text[start..].find(FENCE)? + start;
    if end > start {
        Some(text[start..end].trim())
    } else {
        None
    }
}

/// Deserialize the JSON payload of a model answer.
///
/// # Errors
///
/// Returns a [`JsonError`] when the payload does not match `T`.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> SomniaResult<T> {
    let payload = extract_json(text);
    serde_json::from_str(payload)
        .map_err(|e| JsonError::new(format!("Failed to parse model JSON: {}", e)).into())
}

/// Three-act outline with `beats` generic beats.
///
/// Beats are spread as evenly as possible, earlier acts taking the extra.
pub fn fallback_outline(analysis: &ThemeAnalysis, beats: usize) -> Outline {
    let beats = beats.max(1);
    let mut acts = Vec::with_capacity(ACT_TITLES.len());
    let mut number = 1;
    for (i, title) in ACT_TITLES.iter().enumerate() {
        let share = beats / ACT_TITLES.len() + usize::from(i < beats % ACT_TITLES.len());
        let act_beats: Vec<OutlineBeat> = (0..share)
            .map(|_| {
                let beat = OutlineBeat::generic(number);
                number += 1;
                beat
            })
            .collect();
        if !act_beats.is_empty() {
            acts.push(OutlineAct {
                act_number: (i + 1) as u32,
                title: (*title).to_string(),
                beats: act_beats,
            });
        }
    }

    Outline {
        story_bible: StoryBible {
            setting: analysis.setting.clone(),
            time_of_day: analysis
                .time_of_day
                .clone()
                .unwrap_or_else(|| "dawn".to_string()),
            key_objects: analysis.key_objects.clone(),
            spatial_waypoints: analysis.spatial_waypoints.clone(),
            ..StoryBible::default()
        },
        acts,
    }
}

/// Force an outline to exactly `beats` beats.
///
/// Extra beats are dropped from the end; missing ones are appended as generic
/// beats to the last act.
pub fn normalize_outline(mut outline: Outline, beats: usize) -> Outline {
    let beats = beats.max(1);
    let current = outline.beat_count();
    if current > beats {
        outline.truncate_beats(beats);
    } else if current < beats {
        if outline.acts.is_empty() {
            outline.acts.push(OutlineAct {
                act_number: 1,
                title: ACT_TITLES[0].to_string(),
                beats: Vec::new(),
            });
        }
        if let Some(last) = outline.acts.last_mut() {
            for number in current + 1..=beats {
                last.beats.push(OutlineBeat::generic(number));
            }
        }
    }
    debug!(before = current, after = outline.beat_count(), "Outline normalized");
    outline
}

/// Makes the theme and outline calls for a run.
#[derive(Debug)]
pub struct OutlinePlanner<'a, D: ?Sized> {
    client: &'a ResilientClient<D>,
    config: &'a GenerationConfig,
}

impl<'a, D> OutlinePlanner<'a, D>
where
    D: InferenceDriver + ?Sized,
{
    /// Planner sharing the run's client and configuration.
    pub fn new(client: &'a ResilientClient<D>, config: &'a GenerationConfig) -> Self {
        Self { client, config }
    }

    fn options(&self) -> InferenceOptions {
        InferenceOptions::new(
            self.config.temperatures.generator,
            self.config.max_tokens_outline,
        )
    }

    /// Enrich the theme, falling back to a minimal analysis.
    #[instrument(skip(self, description))]
    pub async fn analyze_theme(&self, theme: &str, description: Option<&str>) -> ThemeAnalysis {
        let mut prompt = theme_analysis_prompt(theme, description, &self.config.embodiment);
        let model = self.config.models.generator.as_str();

        for attempt in 1..=self.config.outline_attempts {
            let completion = self.client.complete(model, &prompt, self.options()).await;
            if !completion.is_degraded() {
                match parse_model_json::<ThemeAnalysis>(&completion.text) {
                    Ok(analysis) => {
                        info!(attempt, setting = %analysis.setting, "Theme analyzed");
                        return analysis;
                    }
                    Err(e) => warn!(attempt, error = %e, "Theme analysis unusable"),
                }
            }
            prompt = format!("{}\n\nTheme: {}", THEME_REPAIR_PROMPT, theme);
        }

        warn!("Theme analysis failed on every attempt, using fallback");
        ThemeAnalysis::fallback(theme)
    }

    /// Generate an outline with exactly the configured number of beats.
    #[instrument(skip(self, analysis), fields(setting = %analysis.setting))]
    pub async fn generate_outline(&self, analysis: &ThemeAnalysis, duration_minutes: u32) -> Outline {
        let mut prompt = outline_prompt(analysis, duration_minutes, self.config);
        let model = self.config.models.generator.as_str();

        for attempt in 1..=self.config.outline_attempts {
            let completion = self.client.complete(model, &prompt, self.options()).await;
            if !completion.is_degraded() {
                match parse_model_json::<Outline>(&completion.text) {
                    Ok(outline) if outline.beat_count() > 0 => {
                        info!(
                            attempt,
                            beats = outline.beat_count(),
                            acts = outline.acts.len(),
                            "Outline generated"
                        );
                        return normalize_outline(outline, self.config.beats);
                    }
                    Ok(_) => warn!(attempt, "Outline has no beats"),
                    Err(e) => warn!(attempt, error = %e, "Outline unusable"),
                }
            }
            prompt = format!(
                "{}\n\nSetting: {}\nBeats: {}",
                OUTLINE_REPAIR_PROMPT, analysis.setting, self.config.beats
            );
        }

        warn!("Outline generation failed on every attempt, using fallback");
        fallback_outline(analysis, self.config.beats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_outline_spreads_beats() {
        let analysis = ThemeAnalysis::fallback("quiet lake");
        let outline = fallback_outline(&analysis, 4);
        let sizes: Vec<usize> = outline.acts.iter().map(|a| a.beats.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
        assert_eq!(outline.story_bible.setting, "quiet lake");
    }

    #[test]
    fn test_extract_json_prefers_fences() {
        let text = "Intro {not json}\n```\n{\"x\": 1}\n```";
        assert_eq!(extract_json(text), "{\"x\": 1}");
    }
}
