/*!
 * Per-run metrics for the annotation pipeline.
 *
 * A `PipelineMetrics` value is owned by a single run. It is updated only between
 * settled batches and cloned into every progress snapshot and the final result,
 * so there is no shared counter to reset between runs.
 */

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::detector::DetectionSource;
use super::model::Phase;

/// Which port operation a counter tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortMode {
    Literal,
    Contextual,
    Simplify,
}

/// Counters for one port operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModeCounters {
    /// Calls issued to the port
    pub calls: usize,
    /// Calls that returned a usable result
    pub successes: usize,
    /// Calls that failed and fell back to the source text
    pub failures: usize,
    /// Calls that needed an interactive trigger and got a placeholder
    pub interaction_required: usize,
    /// Wall time spent waiting on this operation, summed over calls
    pub total_time: Duration,
}

impl ModeCounters {
    /// Fold another counter set into this one
    pub fn merge(&mut self, other: &ModeCounters) {
        self.calls += other.calls;
        self.successes += other.successes;
        self.failures += other.failures;
        self.interaction_required += other.interaction_required;
        self.total_time += other.total_time;
    }

    /// Average latency per call
    pub fn average_time(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.calls as u32
        }
    }
}

/// Call outcomes recorded while translating one chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkUsage {
    pub literal: ModeCounters,
    pub contextual: ModeCounters,
    pub simplify: ModeCounters,
}

impl ChunkUsage {
    pub fn counters_mut(&mut self, mode: PortMode) -> &mut ModeCounters {
        match mode {
            PortMode::Literal => &mut self.literal,
            PortMode::Contextual => &mut self.contextual,
            PortMode::Simplify => &mut self.simplify,
        }
    }
}

/// Aggregated metrics for a pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    /// Where the document language came from
    pub detection_source: Option<DetectionSource>,
    /// Time spent in each completed phase
    pub phase_timings: BTreeMap<Phase, Duration>,
    pub literal: ModeCounters,
    pub contextual: ModeCounters,
    pub simplify: ModeCounters,
    pub segments_total: usize,
    pub target_segments: usize,
    /// Segments collapsed into a single fallback chunk
    pub degraded_segments: usize,
    /// Chunks whose translation task was rejected and dropped
    pub dropped_chunks: usize,
    pub relocated_offsets: usize,
    pub approximate_offsets: usize,
    pub chunks_emitted: usize,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the time spent in a phase
    pub fn record_phase(&mut self, phase: Phase, elapsed: Duration) {
        *self.phase_timings.entry(phase).or_insert(Duration::ZERO) += elapsed;
    }

    /// Fold the usage of one settled chunk task
    pub fn record_usage(&mut self, usage: &ChunkUsage) {
        self.literal.merge(&usage.literal);
        self.contextual.merge(&usage.contextual);
        self.simplify.merge(&usage.simplify);
    }

    /// Whether the language had to be substituted with the target language
    pub fn detection_degraded(&self) -> bool {
        matches!(self.detection_source, Some(DetectionSource::Fallback) | None)
    }

    /// Total port calls across all modes
    pub fn total_calls(&self) -> usize {
        self.literal.calls + self.contextual.calls + self.simplify.calls
    }

    /// Total time across recorded phases
    pub fn total_time(&self) -> Duration {
        self.phase_timings.values().sum()
    }

    /// Generate a summary of the run
    pub fn summary(&self) -> String {
        let phases = self
            .phase_timings
            .iter()
            .map(|(phase, d)| format!("{}={:.1}ms", phase, d.as_secs_f64() * 1000.0))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Annotation Summary:\n\
             Chunks: {} ({} dropped, {} approximate offsets)\n\
             Segments: {} ({} target, {} degraded)\n\
             Literal calls: {} ({} failed, {} need interaction)\n\
             Contextual calls: {} ({} failed)\n\
             Simplify calls: {} ({} failed)\n\
             Phases: {}",
            self.chunks_emitted,
            self.dropped_chunks,
            self.approximate_offsets,
            self.segments_total,
            self.target_segments,
            self.degraded_segments,
            self.literal.calls,
            self.literal.failures,
            self.literal.interaction_required,
            self.contextual.calls,
            self.contextual.failures,
            self.simplify.calls,
            self.simplify.failures,
            phases
        )
    }
}
