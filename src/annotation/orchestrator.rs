/*!
 * The annotation pipeline driver.
 *
 * Phases run once each, in order: extract, detect, segment, prechunk,
 * translate (or simplify when source and target languages coincide), finalize.
 *
 * Concurrency is bounded fan-out without spawning:
 * - every target segment is chunked at once (`join_all`)
 * - each segment's chunks are translated in windows of `batch_width`, one
 *   window at a time
 *
 * Output and metrics are only touched after a window has settled, so chunk
 * order always follows the document. Cancellation is checked at the top of
 * every phase, before every window and before every fallback.
 */

use futures::FutureExt;
use futures::future::join_all;
use log::{debug, info, warn};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app_config::PipelineConfig;
use crate::errors::{AnnotationError, ChunkError};
use crate::language_utils::{language_codes_match, normalize_language_tag};

use super::chunker::{HeuristicPhraseSource, PhraseChunker, PhraseSource};
use super::detector::{DetectionSource, LanguageDetector};
use super::metrics::PipelineMetrics;
use super::model::{
    AnnotatedChunk, AnnotationResult, ChunkType, ExtractedText, OffsetAlignment, Phase, PhraseChunk,
    ProgressSnapshot, TextSegment,
};
use super::port::{TranslationPort, simplify_chunk, translate_chunk};
use super::segmenter::Segmenter;
use super::vocabulary::VocabularyLookup;

/// What the translate phase does with one segment
enum SegmentPlan {
    /// Foreign text or separators, emitted unchanged
    Passthrough,
    Chunks(Vec<PhraseChunk>),
    /// Chunking failed; emitted as one fallback chunk
    Failed(String),
}

/// Mutable state of one run
#[derive(Default)]
struct RunState {
    chunks: Vec<AnnotatedChunk>,
    metrics: PipelineMetrics,
    total_expected: Option<usize>,
}

impl RunState {
    fn snapshot(&self, phase: Phase, is_complete: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            chunks: self.chunks.clone(),
            is_complete,
            total_expected_chunks: self.total_expected,
            phase,
            metrics: self.metrics.clone(),
        }
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), AnnotationError> {
    if cancel.is_cancelled() {
        Err(AnnotationError::Cancelled)
    } else {
        Ok(())
    }
}

/// Annotates extracted text with per-chunk translations
pub struct AnnotationPipeline {
    config: PipelineConfig,
    detector: LanguageDetector,
    segmenter: Segmenter,
    chunker: PhraseChunker,
    port: Arc<dyn TranslationPort>,
    vocabulary: Option<Arc<dyn VocabularyLookup>>,
}

impl AnnotationPipeline {
    /// Create a pipeline with the heuristic phrase source
    pub fn new(config: PipelineConfig, port: Arc<dyn TranslationPort>) -> Self {
        let source = HeuristicPhraseSource::new(config.max_phrase_words, config.max_logographic_run);
        Self {
            detector: LanguageDetector::new(config.min_detection_confidence),
            segmenter: Segmenter::new(),
            chunker: PhraseChunker::new(Arc::new(source)),
            port,
            vocabulary: None,
            config,
        }
    }

    /// Replace the phrase source used for chunking
    pub fn with_phrase_source(mut self, source: Arc<dyn PhraseSource>) -> Self {
        self.chunker = PhraseChunker::new(source);
        self
    }

    /// Attach a vocabulary store; single-word chunks get their known level
    pub fn with_vocabulary(mut self, vocabulary: Arc<dyn VocabularyLookup>) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Annotate `input`, reporting each snapshot to `on_progress`
    pub async fn annotate(
        &self,
        input: &ExtractedText,
        target_language: &str,
        on_progress: Option<&dyn Fn(&ProgressSnapshot)>,
        cancel: &CancellationToken,
    ) -> Result<AnnotationResult, AnnotationError> {
        self.run(input, target_language, cancel, |snapshot| {
            if let Some(callback) = on_progress {
                callback(&snapshot);
            }
        })
        .await
    }

    /// Annotate `input`, sending each snapshot into `progress`.
    ///
    /// A dropped receiver does not stop the run.
    pub async fn annotate_streaming(
        &self,
        input: &ExtractedText,
        target_language: &str,
        progress: mpsc::UnboundedSender<ProgressSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<AnnotationResult, AnnotationError> {
        self.run(input, target_language, cancel, move |snapshot| {
            if progress.send(snapshot).is_err() {
                debug!("Progress receiver dropped");
            }
        })
        .await
    }

    async fn run<E>(
        &self,
        input: &ExtractedText,
        target_language: &str,
        cancel: &CancellationToken,
        mut emit: E,
    ) -> Result<AnnotationResult, AnnotationError>
    where
        E: FnMut(ProgressSnapshot),
    {
        let mut state = RunState::default();

        // Extract
        let phase_start = Instant::now();
        ensure_active(cancel)?;
        let target = normalize_language_tag(target_language).ok_or_else(|| {
            AnnotationError::InvalidInput(format!("unsupported target language '{}'", target_language))
        })?;
        let plain_text = input.plain_text();
        if plain_text.trim().is_empty() {
            return Err(AnnotationError::InvalidInput("document has no text content".to_string()));
        }
        state.metrics.record_phase(Phase::Extract, phase_start.elapsed());

        // Detect
        let phase_start = Instant::now();
        ensure_active(cancel)?;
        let detected = match self.detector.detect(&plain_text, input.declared_language.as_deref()) {
            Some(detection) => {
                info!(
                    "Detected language '{}' ({:?}, confidence {:.2})",
                    detection.language, detection.source, detection.confidence
                );
                state.metrics.detection_source = Some(detection.source);
                detection.language
            }
            None => {
                warn!("Language detection failed, assuming target language '{}'", target);
                state.metrics.detection_source = Some(DetectionSource::Fallback);
                target.clone()
            }
        };
        let simplify_mode = language_codes_match(&detected, &target);
        state.metrics.record_phase(Phase::Detect, phase_start.elapsed());
        emit(state.snapshot(Phase::Detect, false));

        // Segment
        let phase_start = Instant::now();
        ensure_active(cancel)?;
        let segments = self.segmenter.segment(&plain_text, &detected);
        state.metrics.segments_total = segments.len();
        state.metrics.target_segments = segments.iter().filter(|s| s.is_target_language).count();
        info!(
            "Segmented text into {} segments ({} in '{}')",
            segments.len(),
            state.metrics.target_segments,
            detected
        );
        state.metrics.record_phase(Phase::Segment, phase_start.elapsed());
        emit(state.snapshot(Phase::Segment, false));

        // Prechunk
        let phase_start = Instant::now();
        ensure_active(cancel)?;
        let plans = self.prechunk(&segments, &detected, cancel).await?;
        let total_expected: usize = plans
            .iter()
            .map(|plan| match plan {
                SegmentPlan::Chunks(chunks) => chunks.len(),
                SegmentPlan::Passthrough | SegmentPlan::Failed(_) => 1,
            })
            .sum();
        let planned_chunks = plans
            .iter()
            .filter_map(|plan| match plan {
                SegmentPlan::Chunks(chunks) => Some(chunks),
                _ => None,
            })
            .flatten();
        for chunk in planned_chunks {
            match chunk.alignment {
                OffsetAlignment::Relocated => state.metrics.relocated_offsets += 1,
                OffsetAlignment::Approximate => state.metrics.approximate_offsets += 1,
                OffsetAlignment::Exact => {}
            }
        }
        state.total_expected = Some(total_expected);
        info!("Prechunked {} expected chunks", total_expected);
        state.metrics.record_phase(Phase::Prechunk, phase_start.elapsed());
        emit(state.snapshot(Phase::Prechunk, false));

        // Translate or simplify
        let phase = if simplify_mode { Phase::Simplify } else { Phase::Translate };
        let phase_start = Instant::now();
        ensure_active(cancel)?;
        info!("Starting {} phase ({} -> {})", phase, detected, target);
        for (index, (segment, plan)) in segments.iter().zip(plans).enumerate() {
            match plan {
                SegmentPlan::Passthrough => {
                    let language = self.detector.tag_span(&segment.text);
                    state.chunks.push(AnnotatedChunk::passthrough(segment, ChunkType::Foreign, language));
                }
                SegmentPlan::Failed(reason) => {
                    ensure_active(cancel)?;
                    self.degrade_segment(&mut state, index, segment, &detected, reason);
                }
                SegmentPlan::Chunks(chunks) => {
                    let emitted = self
                        .process_segment(
                            &mut state,
                            &mut emit,
                            SegmentContext {
                                segment,
                                plain_text: &plain_text,
                                source: &detected,
                                target: &target,
                                simplify_mode,
                                phase,
                            },
                            &chunks,
                            cancel,
                        )
                        .await?;
                    if emitted == 0 {
                        ensure_active(cancel)?;
                        self.degrade_segment(&mut state, index, segment, &detected, "every chunk was rejected".to_string());
                    }
                }
            }
        }
        state.metrics.record_phase(phase, phase_start.elapsed());

        // Finalize
        let phase_start = Instant::now();
        ensure_active(cancel)?;
        state.metrics.chunks_emitted = state.chunks.len();
        state.total_expected = Some(state.chunks.len());
        state.metrics.record_phase(Phase::Finalize, phase_start.elapsed());
        emit(state.snapshot(Phase::Finalize, true));
        info!("{}", state.metrics.summary());

        Ok(AnnotationResult {
            plain_text,
            chunks: state.chunks,
            detected_language: detected,
            simplify_mode,
            metrics: state.metrics,
        })
    }

    /// Chunk every target segment concurrently
    async fn prechunk(
        &self,
        segments: &[TextSegment],
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SegmentPlan>, AnnotationError> {
        let tasks = segments.iter().map(|segment| async move {
            if !segment.is_target_language {
                return None;
            }
            let result = AssertUnwindSafe(self.chunker.chunk(&segment.text, language, cancel))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ChunkError::Failed("phrase source panicked".to_string())));
            Some(result)
        });
        let settled = join_all(tasks).await;

        let mut plans = Vec::with_capacity(settled.len());
        for result in settled {
            let plan = match result {
                None => SegmentPlan::Passthrough,
                Some(Ok(chunks)) if chunks.is_empty() => SegmentPlan::Failed("no phrases proposed".to_string()),
                Some(Ok(chunks)) => SegmentPlan::Chunks(chunks),
                Some(Err(ChunkError::Cancelled)) => return Err(AnnotationError::Cancelled),
                Some(Err(ChunkError::Failed(reason))) => SegmentPlan::Failed(reason),
            };
            plans.push(plan);
        }
        ensure_active(cancel)?;
        Ok(plans)
    }

    /// Translate one segment window by window; returns the chunks appended
    async fn process_segment<E>(
        &self,
        state: &mut RunState,
        emit: &mut E,
        ctx: SegmentContext<'_>,
        chunks: &[PhraseChunk],
        cancel: &CancellationToken,
    ) -> Result<usize, AnnotationError>
    where
        E: FnMut(ProgressSnapshot),
    {
        let port: &dyn TranslationPort = self.port.as_ref();
        let width = self.config.batch_width.max(1);
        let mut emitted = 0;

        for (window_index, window) in chunks.chunks(width).enumerate() {
            ensure_active(cancel)?;
            debug!(
                "Segment at {}: dispatching window {} ({} chunks)",
                ctx.segment.start,
                window_index + 1,
                window.len()
            );

            let calls = window.iter().map(|chunk| {
                let segment = ctx.segment;
                let call = async move {
                    if ctx.simplify_mode {
                        simplify_chunk(
                            port,
                            &chunk.text,
                            ctx.plain_text,
                            segment.start + chunk.start,
                            segment.start + chunk.end,
                        )
                        .await
                    } else {
                        translate_chunk(port, &chunk.text, &segment.text, ctx.source, ctx.target).await
                    }
                };
                AssertUnwindSafe(call).catch_unwind()
            });
            let settled = join_all(calls).await;

            for (chunk, outcome) in window.iter().zip(settled) {
                match outcome {
                    Ok(outcome) => {
                        state.metrics.record_usage(&outcome.usage);
                        let mut annotated = AnnotatedChunk::from_phrase(
                            ctx.segment,
                            chunk,
                            outcome.translation,
                            Some(ctx.source.to_string()),
                        );
                        if chunk.chunk_type == ChunkType::Word {
                            annotated.known_level = self
                                .vocabulary
                                .as_ref()
                                .and_then(|v| v.known_word_level(&chunk.text, ctx.source));
                        }
                        state.chunks.push(annotated);
                        emitted += 1;
                    }
                    Err(_) => {
                        warn!("Dropping chunk '{}': translation task panicked", chunk.text);
                        state.metrics.dropped_chunks += 1;
                    }
                }
            }
            emit(state.snapshot(ctx.phase, false));
        }
        Ok(emitted)
    }

    /// Collapse a segment into one chunk that mirrors its text
    fn degrade_segment(&self, state: &mut RunState, index: usize, segment: &TextSegment, language: &str, reason: String) {
        let failure = AnnotationError::SegmentProcessingFailed { index, reason };
        warn!("{}; emitting the segment untranslated", failure);
        state.metrics.degraded_segments += 1;
        state
            .chunks
            .push(AnnotatedChunk::passthrough(segment, ChunkType::Phrase, Some(language.to_string())));
    }
}

/// Per-segment inputs shared by every call in its windows
#[derive(Clone, Copy)]
struct SegmentContext<'a> {
    segment: &'a TextSegment,
    plain_text: &'a str,
    source: &'a str,
    target: &'a str,
    simplify_mode: bool,
    phase: Phase,
}
