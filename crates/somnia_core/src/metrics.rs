//! Metrics reported by the pipeline and the coordinator.

use serde::{Deserialize, Serialize};

/// Cumulative counters kept by the stage pipeline across one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineMetrics {
    /// Words produced by generator calls.
    pub generator_words: usize,
    /// Words produced by reasoner calls.
    pub reasoner_words: usize,
    /// Words produced by polisher calls.
    pub polisher_words: usize,
    /// Reasoner invocations (critique passes and corrective rewrites).
    pub corrections_count: usize,
    /// Reasoner passes that acted on at least one critique hint.
    pub coherence_improvements: usize,
}

/// Final metrics for one story run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoryMetrics {
    /// Words in the assembled story.
    pub word_count: usize,
    /// Words requested (duration × WPM).
    pub target_words: usize,
    /// 100 minus the deviation percentage, floored at 0.
    pub accuracy_percent: f64,
    /// Absolute deviation from the target in percent.
    pub deviation_percent: f64,
    /// Estimated narration length at the configured WPM.
    pub duration_estimate_minutes: f64,
    /// Beats in the final story.
    pub beats_generated: usize,
    /// Scheduler targets in beat order.
    pub beat_targets: Vec<usize>,
    /// Stage counters.
    pub pipeline: PipelineMetrics,
    /// Embodiment score per beat.
    pub embodiment_scores: Vec<u8>,
    /// Mean embodiment score.
    pub embodiment_average: f64,
    /// Beats still failing embodiment after correction.
    pub embodiment_failures: Vec<usize>,
    /// Whether the destination arc is complete.
    pub destination_complete: bool,
    /// Missing arc phases after correction.
    pub destination_missing: Vec<String>,
    /// Corrective passes actually run.
    pub correction_passes: usize,
    /// Beats replaced by the corrective pass.
    pub corrected_beats: Vec<usize>,
    /// Beats regenerated for repetition.
    pub repetition_regenerations: usize,
    /// Beats whose text is the inference placeholder.
    pub degraded_beats: Vec<usize>,
    /// Wall-clock generation time.
    pub generation_seconds: f64,
}

/// Coherence and memory statistics for one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoherenceStats {
    /// Beats currently held in the context window.
    pub context_beats: usize,
    /// Characters tracked.
    pub tracked_characters: usize,
    /// Locations tracked.
    pub tracked_locations: usize,
    /// Objects tracked.
    pub tracked_objects: usize,
    /// Distinct 3-word phrases remembered.
    pub key_phrases: usize,
    /// Phrases seen more than once.
    pub forbidden_repetitions: usize,
    /// Mean coherence score over all beats.
    pub average_coherence: f64,
    /// Beats that scored below the revision threshold.
    pub beats_needing_revision: usize,
    /// Beats that scored below the severe threshold.
    pub severe_beats: usize,
}
