//! Generate → reason → polish pipeline for a single beat.

use crate::critique::{CritiqueLexicon, HeuristicCritic};
use crate::prompts::{
    FALLBACK_SPATIAL_BRIEF, correction_prompt, polisher_prompt, reasoner_prompt,
    spatial_coach_prompt,
};
use crate::scheduler::{OPENER_DENYLIST, vary_opener};
use crate::{DestinationPhase, GenerationConfig, ResilientClient, enforce_length};
use somnia_core::{
    Beat, BeatPlan, InferenceOptions, PipelineMetrics, SensoryMode, StageWordCounts, word_count,
};
use somnia_interface::InferenceDriver;
use std::collections::VecDeque;
use tracing::{debug, info, instrument, warn};

/// Beat summaries kept in the rolling outline memory.
const SUMMARY_CAPACITY: usize = 5;
/// Summaries rendered into each prompt.
const SUMMARIES_RENDERED: usize = 3;
/// Words of a beat kept in its summary.
const SUMMARY_WORDS: usize = 24;

/// Pipeline state saved before a draft that may be discarded.
#[derive(Debug, Clone)]
pub struct PipelineCheckpoint {
    critic: HeuristicCritic,
    metrics: PipelineMetrics,
}

/// Runs the three stages for each beat of one story.
///
/// Holds the run's cumulative [`PipelineMetrics`], the critic's opener
/// history and the rolling outline memory, so one pipeline must not be
/// shared between runs.
#[derive(Debug)]
pub struct StagePipeline<D: ?Sized> {
    client: ResilientClient<D>,
    config: GenerationConfig,
    critic: HeuristicCritic,
    summaries: VecDeque<String>,
    metrics: PipelineMetrics,
}

impl<D> StagePipeline<D>
where
    D: InferenceDriver + ?Sized,
{
    /// Pipeline for one run.
    pub fn new(client: ResilientClient<D>, config: GenerationConfig) -> Self {
        let critic = HeuristicCritic::new(
            CritiqueLexicon::for_language(config.language),
            config.opener_penalty_threshold,
            config.sensory_density_threshold,
        );
        Self {
            client,
            config,
            critic,
            summaries: VecDeque::with_capacity(SUMMARY_CAPACITY),
            metrics: PipelineMetrics::default(),
        }
    }

    /// Cumulative counters for the run.
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics
    }

    /// Save the metrics and critic state.
    pub fn checkpoint(&self) -> PipelineCheckpoint {
        PipelineCheckpoint {
            critic: self.critic.clone(),
            metrics: self.metrics,
        }
    }

    /// Forget every draft generated since `checkpoint` was taken.
    ///
    /// The outline memory is left alone; summaries are only recorded for
    /// accepted beats.
    pub fn rollback(&mut self, checkpoint: &PipelineCheckpoint) {
        self.critic = checkpoint.critic.clone();
        self.metrics = checkpoint.metrics;
    }

    /// Summaries currently in the rolling outline memory, oldest first.
    pub fn outline_memory(&self) -> impl Iterator<Item = &str> {
        self.summaries.iter().map(String::as_str)
    }

    /// Openers flagged by the critique during the run.
    pub fn dynamic_denylist(&self) -> &[String] {
        self.critic.dynamic_denylist()
    }

    /// Add an accepted beat to the rolling outline memory.
    pub fn record_summary(&mut self, beat: &Beat) {
        let excerpt: Vec<&str> = beat.text.split_whitespace().take(SUMMARY_WORDS).collect();
        let summary = format!(
            "Beat {} \"{}\" at {} ({}): {}",
            beat.index + 1,
            beat.title,
            if beat.waypoint.is_empty() {
                "the path"
            } else {
                beat.waypoint.as_str()
            },
            beat.sensory_mode,
            excerpt.join(" ")
        );
        if self.summaries.len() == SUMMARY_CAPACITY {
            self.summaries.pop_front();
        }
        self.summaries.push_back(summary);
    }

    /// Generate one beat.
    ///
    /// `index` is 0-based and `progress` the story fraction (0–1) this beat
    /// completes. The effective word target is `target_words` scaled by the
    /// taper density for `progress`.
    #[instrument(skip(self, base_prompt, waypoints, title), fields(beat_index = index))]
    pub async fn generate_beat(
        &mut self,
        base_prompt: &str,
        index: usize,
        progress: f64,
        waypoints: &[String],
        target_words: usize,
        title: &str,
    ) -> Beat {
        let sensory_mode = SensoryMode::for_beat(index);
        let waypoint = if waypoints.is_empty() {
            String::new()
        } else {
            waypoints[index % waypoints.len()].clone()
        };
        let density_factor = self.config.taper.density_for(progress);
        let target = ((target_words as f64 * density_factor).round() as usize).max(1);
        let plan = build_plan(index, sensory_mode, &waypoint, density_factor);
        let prompt = self.compose_prompt(base_prompt, &plan, sensory_mode, &waypoint);

        let mut stage_words = StageWordCounts::default();

        let generated = self
            .client
            .complete(
                &self.config.models.generator,
                &prompt,
                InferenceOptions::new(
                    self.config.temperatures.generator,
                    self.config.max_tokens_beat,
                ),
            )
            .await;

        if generated.is_degraded() {
            warn!("Generator degraded, skipping later stages");
            return Beat {
                index,
                title: title.to_string(),
                word_count: word_count(&generated.text),
                text: generated.text,
                sensory_mode,
                waypoint,
                target_words: target,
                density_factor,
                plan,
                stage_words,
                degraded: true,
            };
        }

        stage_words.generator = word_count(&generated.text);
        self.metrics.generator_words += stage_words.generator;
        let mut text = vary_opener(&generated.text);

        if self.config.models.use_reasoner {
            let critique = self.critic.critique(&text);
            let reasoned = self
                .client
                .complete(
                    &self.config.models.reasoner,
                    &reasoner_prompt(
                        &text,
                        &plan,
                        &critique.hints,
                        target,
                        self.config.language,
                    ),
                    self.stage_options(self.config.temperatures.reasoner, target),
                )
                .await;
            self.metrics.corrections_count += 1;
            if reasoned.is_degraded() {
                warn!("Reasoner degraded, keeping generator text");
            } else {
                stage_words.reasoner = word_count(&reasoned.text);
                self.metrics.reasoner_words += stage_words.reasoner;
                if !critique.hints.is_empty() {
                    self.metrics.coherence_improvements += 1;
                }
                text = reasoned.text;
            }
        }

        if self.config.models.use_polish {
            let polished = self
                .client
                .complete(
                    &self.config.models.polisher,
                    &polisher_prompt(&text, target, self.config.language),
                    self.stage_options(self.config.temperatures.polisher, target),
                )
                .await;
            if polished.is_degraded() {
                warn!("Polisher degraded, keeping previous text");
            } else {
                stage_words.polisher = word_count(&polished.text);
                self.metrics.polisher_words += stage_words.polisher;
                text = polished.text;
            }
        }

        let text = enforce_length(&text, target, self.config.length_tolerance);
        let words = word_count(&text);
        info!(target, words, ?stage_words, "Beat generated");

        Beat {
            index,
            title: title.to_string(),
            text,
            sensory_mode,
            waypoint,
            target_words: target,
            word_count: words,
            density_factor,
            plan,
            stage_words,
            degraded: false,
        }
    }

    /// Rewrite a beat for the corrective pass.
    ///
    /// Uses the reasoner when enabled and the generator otherwise. A degraded
    /// call returns the beat unchanged.
    #[instrument(skip(self, beat, instructions), fields(beat_index = beat.index))]
    pub async fn correct_beat(&mut self, beat: &Beat, instructions: &[String]) -> Beat {
        let (model, temperature) = if self.config.models.use_reasoner {
            (
                self.config.models.reasoner.clone(),
                self.config.temperatures.reasoner,
            )
        } else {
            (
                self.config.models.generator.clone(),
                self.config.temperatures.generator,
            )
        };
        let prompt = correction_prompt(
            &beat.text,
            instructions,
            beat.target_words,
            self.config.language,
        );
        let completion = self
            .client
            .complete(
                &model,
                &prompt,
                self.stage_options(temperature, beat.target_words),
            )
            .await;

        if completion.is_degraded() {
            warn!("Correction degraded, keeping original beat");
            return beat.clone();
        }

        let words = word_count(&completion.text);
        let mut stage_words = beat.stage_words;
        if self.config.models.use_reasoner {
            self.metrics.corrections_count += 1;
            self.metrics.reasoner_words += words;
            stage_words.reasoner = words;
        } else {
            self.metrics.generator_words += words;
            stage_words.generator = words;
        }

        let text = enforce_length(
            &vary_opener(&completion.text),
            beat.target_words,
            self.config.length_tolerance,
        );
        debug!(before = beat.word_count, after = word_count(&text), "Beat corrected");

        Beat {
            word_count: word_count(&text),
            text,
            stage_words,
            degraded: false,
            ..beat.clone()
        }
    }

    /// One- or two-sentence movement brief for a corrective prompt.
    ///
    /// Falls back to a fixed brief when the reasoner cannot be reached.
    #[instrument(skip(self, text))]
    pub async fn spatial_brief(&self, text: &str, waypoint: &str, phase: DestinationPhase) -> String {
        let completion = self
            .client
            .complete(
                &self.config.models.reasoner,
                &spatial_coach_prompt(text, waypoint, phase, self.config.language),
                InferenceOptions::new(0.2, 150),
            )
            .await;
        if completion.is_degraded() {
            FALLBACK_SPATIAL_BRIEF.to_string()
        } else {
            completion.text
        }
    }

    fn stage_options(&self, temperature: f32, target: usize) -> InferenceOptions {
        let budget = u32::try_from(target.saturating_mul(2)).unwrap_or(u32::MAX);
        InferenceOptions::new(temperature, budget.max(self.config.max_tokens_beat))
    }

    fn compose_prompt(
        &self,
        base_prompt: &str,
        plan: &BeatPlan,
        sensory_mode: SensoryMode,
        waypoint: &str,
    ) -> String {
        let mut prompt = base_prompt.to_string();

        let start = self.summaries.len().saturating_sub(SUMMARIES_RENDERED);
        let recent: Vec<&String> = self.summaries.iter().skip(start).collect();
        if !recent.is_empty() {
            prompt.push_str("\n\nSTORY SO FAR:");
            for summary in recent {
                prompt.push_str("\n- ");
                prompt.push_str(summary);
            }
        }

        prompt.push_str("\n\n");
        prompt.push_str(&plan.render());

        prompt.push_str(&format!("\n\nSENSORY MODE: {}", sensory_mode));
        if !waypoint.is_empty() {
            prompt.push_str(&format!("\nWAYPOINT: {}", waypoint));
        }

        let denylist: Vec<String> = OPENER_DENYLIST
            .iter()
            .map(|o| o.trim().to_string())
            .chain(self.critic.dynamic_denylist().iter().cloned())
            .collect();
        prompt.push_str(&format!(
            "\n\nNEVER OPEN WITH: {}",
            denylist
                .iter()
                .map(|o| format!("\"{}\"", o))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        prompt
    }
}

fn build_plan(index: usize, sensory_mode: SensoryMode, waypoint: &str, density: f64) -> BeatPlan {
    let place = if waypoint.is_empty() { "the path" } else { waypoint };
    BeatPlan {
        current_state: if index == 0 {
            format!("You stand at the start of the journey, near {}", place)
        } else {
            format!("You are moving calmly through {}", place)
        },
        micro_goal: format!("Notice one {} detail as you reach {}", sensory_mode, place),
        gentle_change: format!(
            "The {} impression softens as you move a little further",
            sensory_mode
        ),
        settling: if density < 1.0 {
            "Let the pace slow almost to stillness and invite the body toward rest".to_string()
        } else {
            "Let the breath lengthen before the next step".to_string()
        },
    }
}
