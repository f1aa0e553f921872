//! Whole-story orchestration.
//!
//! A run goes theme → outline → beats → validation → correction → assembly →
//! metrics. Every run gets its own repetition guard, narrative memory and
//! stage pipeline, so concurrent runs over one coordinator never share state.

use crate::assembly::{assemble_story, build_schema, render_beats, strip_markers};
use crate::destination::beat_for_phase;
use crate::outline::OutlinePlanner;
use crate::prompts::BeatPrompt;
use crate::{
    ArcPhase, CoherenceReport, DestinationLexicon, DestinationPhase, DestinationValidator,
    EmbodimentChecks, EmbodimentLexicon, EmbodimentReport, EmbodimentValidator, GenerationConfig,
    NarrativeMemory, RepetitionGuard, RepetitionLexicon, ResilientClient, StagePipeline,
    WordBudgetScheduler, select_destination,
};
use somnia_core::{
    Beat, CoherenceStats, Outline, OutlineBeat, StoryBible, StoryMetrics, StoryRequest,
    StoryResult, ThemeAnalysis, word_count,
};
use somnia_error::SomniaResult;
use somnia_interface::{InferenceDriver, ProgressSink};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Words of accepted story text shown to the next beat's prompt.
const PREVIOUS_TEXT_WORDS: usize = 500;

/// Drives complete story runs against one inference driver.
#[derive(Debug)]
pub struct StoryPipelineCoordinator<D: ?Sized> {
    client: ResilientClient<D>,
    config: GenerationConfig,
}

impl<D> StoryPipelineCoordinator<D>
where
    D: InferenceDriver + ?Sized,
{
    /// Coordinator over `driver`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `config` fails validation.
    pub fn new(driver: Arc<D>, config: GenerationConfig) -> SomniaResult<Self> {
        config.validate()?;
        let client = ResilientClient::new(driver, config.retry.clone());
        Ok(Self { client, config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a complete story.
    ///
    /// Inference failures degrade individual beats instead of failing, so a
    /// run always produces a result.
    #[instrument(
        skip(self, request, progress),
        fields(theme = %request.theme, duration_minutes = request.duration_minutes)
    )]
    pub async fn generate(&self, request: &StoryRequest, progress: &dyn ProgressSink) -> StoryResult {
        let started = Instant::now();
        let config = &self.config;
        let planner = OutlinePlanner::new(&self.client, config);

        progress.update(5, "Analyzing theme and creating story concept");
        let analysis = planner
            .analyze_theme(&request.theme, request.description.as_deref())
            .await;

        progress.update(10, "Generating story outline");
        let mut outline = planner
            .generate_outline(&analysis, request.duration_minutes)
            .await;

        progress.update(15, "Initializing memory and validators");
        outline.story_bible = enrich_bible(&outline, &analysis, request);
        let bible = outline.story_bible.clone();
        let destination = bible
            .destination
            .clone()
            .unwrap_or_else(|| select_destination(&request.theme, &bible.setting));
        let waypoints = collect_waypoints(&outline, request);
        let outline_beats: Vec<OutlineBeat> = outline.beats().cloned().collect();
        let beat_total = outline_beats.len();

        let mut memory = NarrativeMemory::with_language(bible.clone(), config.language);
        let mut guard = RepetitionGuard::with_lexicon(
            RepetitionLexicon::for_language(config.language),
            request.seed,
        );
        let embodiment = EmbodimentValidator::new(EmbodimentLexicon::for_language(config.language));
        let arc = DestinationValidator::new(DestinationLexicon::for_language(config.language));
        let scheduler = WordBudgetScheduler::new(
            beat_total,
            config.target_words_for(request.duration_minutes),
        );
        let mut pipeline = StagePipeline::new(self.client.clone(), config.clone());

        info!(
            beats = beat_total,
            total_words = scheduler.total_words(),
            destination = %destination,
            waypoints = waypoints.len(),
            "Run initialized"
        );

        progress.update(20, "Generating story content");
        let mut beats: Vec<Beat> = Vec::with_capacity(beat_total);
        let mut coherence: Vec<CoherenceReport> = Vec::with_capacity(beat_total);
        let mut regenerations = 0;

        for (index, outline_beat) in outline_beats.iter().enumerate() {
            let target = scheduler.target_for(index + 1);
            let fraction = (index + 1) as f64 / beat_total as f64;
            let sensory_mode = somnia_core::SensoryMode::for_beat(index);
            let waypoint = if waypoints.is_empty() {
                String::new()
            } else {
                waypoints[index % waypoints.len()].clone()
            };
            let unique = guard.generate_unique_elements(sensory_mode, &waypoint, index);
            let phase = DestinationPhase::for_beat(index, beat_total, &config.destination);
            let forbidden = guard.get_forbidden_phrases();
            let previous = memory.previous_text(PREVIOUS_TEXT_WORDS);
            let continuity = memory.get_coherence_prompt_additions();

            let base_prompt = BeatPrompt::builder()
                .bible(&bible)
                .previous_text(&previous)
                .beat(outline_beat)
                .target_words(target)
                .sensory_mode(sensory_mode)
                .waypoint(&waypoint)
                .phase(phase)
                .destination(&destination)
                .coherence(&continuity)
                .unique(&unique)
                .forbidden(&forbidden)
                .config(config)
                .tts_markers(request.tts_markers)
                .strict_schema(request.strict_schema)
                .build()
                .render();

            let checkpoint = pipeline.checkpoint();
            let mut beat = pipeline
                .generate_beat(
                    &base_prompt,
                    index,
                    fraction,
                    &waypoints,
                    target,
                    &outline_beat.title,
                )
                .await;

            let mut budget = config.repetition_regen_budget;
            while budget > 0 && !beat.degraded && guard.should_regenerate_beat(&beat.text) {
                budget -= 1;
                regenerations += 1;
                let opener = RepetitionGuard::opener_of(&beat.text);
                debug!(beat_index = index, opener = %opener, "Regenerating repetitive beat");
                let prompt = format!(
                    "{}\n\nDO NOT BEGIN WITH: \"{}\". Open with a different image and a different main action.",
                    base_prompt, opener
                );
                pipeline.rollback(&checkpoint);
                beat = pipeline
                    .generate_beat(
                        &prompt,
                        index,
                        fraction,
                        &waypoints,
                        target,
                        &outline_beat.title,
                    )
                    .await;
            }

            let report = memory.validate_beat_coherence(&beat.text, index + 1);
            if report.severe {
                warn!(beat_index = index, score = report.score, issues = ?report.issues, "Beat coherence severe");
            }
            coherence.push(report);

            memory.add_beat_context(index + 1, &beat.text, outline_beat);
            guard.track_beat_content(&beat.text, index);
            pipeline.record_summary(&beat);

            let percent = 20 + (50 * (index + 1) / beat_total.max(1)) as u8;
            progress.update(
                percent,
                &format!(
                    "Writing: {} ({}/{})",
                    outline_beat.title,
                    index + 1,
                    beat_total
                ),
            );
            beats.push(beat);
        }

        progress.update(75, "Validating embodiment and destination arc");
        let mut reports: Vec<EmbodimentReport> = beats
            .iter()
            .map(|b| embodiment.validate_beat(&b.text))
            .collect();
        let mut destination_report = arc.validate_destination_arc(&texts(&beats));

        progress.update(85, "Correcting failing beats");
        let mut passes_run = 0;
        let mut corrected: BTreeSet<usize> = BTreeSet::new();
        for pass in 0..config.correction_passes {
            let failing = failing_beats(&reports, &destination_report.missing, beats.len());
            if failing.is_empty() {
                break;
            }
            passes_run += 1;
            info!(pass, failing = ?failing, "Corrective pass");

            for index in failing {
                let phase = DestinationPhase::for_beat(index, beat_total, &config.destination);
                let mut instructions =
                    embodiment_instructions(&reports[index].checks, config);
                for missing in &destination_report.missing {
                    if beat_for_phase(*missing, beats.len()) == Some(index) {
                        instructions.push(arc_instruction(*missing).instructions(&destination));
                    }
                }
                if config.spatial_coach {
                    let brief = pipeline
                        .spatial_brief(&beats[index].text, &beats[index].waypoint, phase)
                        .await;
                    instructions.push(format!("Spatial brief: {}", brief));
                }

                let candidate = pipeline.correct_beat(&beats[index], &instructions).await;
                let candidate_report = embodiment.validate_beat(&candidate.text);
                if candidate.text != beats[index].text
                    && candidate_report.score >= reports[index].score
                {
                    debug!(
                        beat_index = index,
                        before = reports[index].score,
                        after = candidate_report.score,
                        "Beat replaced"
                    );
                    beats[index] = candidate;
                    reports[index] = candidate_report;
                    corrected.insert(index);
                }
            }
            destination_report = arc.validate_destination_arc(&texts(&beats));
        }

        progress.update(95, "Assembling story and calculating metrics");
        let markers = request.tts_markers || config.tts.markers;
        let rendered = render_beats(&texts(&beats), markers, &config.tts);
        let story_text = assemble_story(&rendered);
        let beats_schema = request
            .strict_schema
            .then(|| build_schema(&beats, &rendered, config.target_wpm, &arc));

        let total_words = word_count(&strip_markers(&story_text));
        let target_words = config.target_words_for(request.duration_minutes);
        let deviation = if target_words == 0 {
            0.0
        } else {
            (total_words as f64 - target_words as f64).abs() / target_words as f64 * 100.0
        };
        let scores: Vec<u8> = reports.iter().map(|r| r.score).collect();
        let embodiment_average = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64
        };

        let metrics = StoryMetrics {
            word_count: total_words,
            target_words,
            accuracy_percent: round2((100.0 - deviation).max(0.0)),
            deviation_percent: round2(deviation),
            duration_estimate_minutes: round1(total_words as f64 / f64::from(config.target_wpm)),
            beats_generated: beats.len(),
            beat_targets: scheduler.targets().to_vec(),
            pipeline: pipeline.metrics(),
            embodiment_scores: scores,
            embodiment_average: round2(embodiment_average),
            embodiment_failures: reports
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.ok)
                .map(|(i, _)| i)
                .collect(),
            destination_complete: destination_report.ok,
            destination_missing: destination_report
                .missing
                .iter()
                .map(|p| p.to_string())
                .collect(),
            correction_passes: passes_run,
            corrected_beats: corrected.into_iter().collect(),
            repetition_regenerations: regenerations,
            degraded_beats: beats
                .iter()
                .filter(|b| b.degraded)
                .map(|b| b.index)
                .collect(),
            generation_seconds: started.elapsed().as_secs_f64(),
        };

        let stats = memory.stats();
        let coherence_stats = CoherenceStats {
            context_beats: stats.context_beats,
            tracked_characters: stats.tracked_characters,
            tracked_locations: stats.tracked_locations,
            tracked_objects: stats.tracked_objects,
            key_phrases: stats.key_phrases,
            forbidden_repetitions: stats.forbidden_repetitions,
            average_coherence: if coherence.is_empty() {
                0.0
            } else {
                round2(coherence.iter().map(|r| r.score).sum::<f64>() / coherence.len() as f64)
            },
            beats_needing_revision: coherence.iter().filter(|r| r.needs_revision).count(),
            severe_beats: coherence.iter().filter(|r| r.severe).count(),
        };

        info!(
            words = metrics.word_count,
            target = metrics.target_words,
            accuracy = metrics.accuracy_percent,
            embodiment = metrics.embodiment_average,
            destination = metrics.destination_complete,
            seconds = metrics.generation_seconds,
            "Story generated"
        );
        progress.update(100, "Generation complete");

        StoryResult {
            story_text,
            outline_summary: outline.summary(),
            outline,
            metrics,
            coherence: coherence_stats,
            beats_schema,
        }
    }
}

fn texts(beats: &[Beat]) -> Vec<&str> {
    beats.iter().map(|b| b.text.as_str()).collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fill gaps in the outline's bible from the theme analysis and request.
fn enrich_bible(outline: &Outline, analysis: &ThemeAnalysis, request: &StoryRequest) -> StoryBible {
    let mut bible = outline.story_bible.clone();
    if bible.setting.trim().is_empty() {
        bible.setting = analysis.setting.clone();
    }
    if bible.key_objects.is_empty() {
        bible.key_objects = analysis.key_objects.clone();
    }
    if let Some(custom) = request.custom_waypoints.as_ref().filter(|w| !w.is_empty()) {
        bible.spatial_waypoints = custom.clone();
    } else if bible.spatial_waypoints.is_empty() {
        bible.spatial_waypoints = analysis.spatial_waypoints.clone();
    }
    if bible.destination.is_none() {
        bible.destination = Some(select_destination(&request.theme, &bible.setting));
    }
    bible
}

/// Waypoints for the run: the bible's, else the outline beats' own.
fn collect_waypoints(outline: &Outline, request: &StoryRequest) -> Vec<String> {
    if let Some(custom) = request.custom_waypoints.as_ref().filter(|w| !w.is_empty()) {
        return custom.clone();
    }
    if !outline.story_bible.spatial_waypoints.is_empty() {
        return outline.story_bible.spatial_waypoints.clone();
    }
    outline
        .beats()
        .filter_map(|b| b.waypoint.clone())
        .filter(|w| !w.trim().is_empty())
        .collect()
}

/// Beats to correct: embodiment failures plus the beats responsible for
/// missing arc phases.
fn failing_beats(reports: &[EmbodimentReport], missing: &[ArcPhase], count: usize) -> BTreeSet<usize> {
    let mut failing: BTreeSet<usize> = reports
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.ok)
        .map(|(i, _)| i)
        .collect();
    failing.extend(missing.iter().filter_map(|p| beat_for_phase(*p, count)));
    failing
}

fn arc_instruction(phase: ArcPhase) -> DestinationPhase {
    match phase {
        ArcPhase::DestinationSetup => DestinationPhase::Departure,
        ArcPhase::JourneyProgress => DestinationPhase::Journey,
        ArcPhase::ArrivalClosure => DestinationPhase::Arrival,
    }
}

fn embodiment_instructions(checks: &EmbodimentChecks, config: &GenerationConfig) -> Vec<String> {
    let requirements = &config.embodiment;
    checks
        .failed()
        .into_iter()
        .map(|check| match check {
            "movement" => format!(
                "Include at least {} movement verb(s) in second person present",
                requirements.movement_verbs_required.max(1)
            ),
            "transition" => "Add a spatial transition connector (further along, beyond, across)".to_string(),
            "sensory_coupling" => {
                "Couple one bodily perception (feet, hands, breath) with one perception of the surroundings (light, sound, scent)".to_string()
            }
            "downshift" => "Add a relaxation cue: the breath slows, the shoulders ease".to_string(),
            "second_person" => "Address the listener directly in the second person".to_string(),
            other => format!("Fix the {} check", other),
        })
        .collect()
}
