/*!
 * The annotation pipeline.
 *
 * Turns extracted document text into an ordered list of small chunks, each
 * with its document offsets and a translation (or same-language
 * simplification), reporting progress as windows of chunks settle.
 *
 * Components, in data-flow order:
 * - `LanguageDetector`: declared tag, then statistics, then script ranges
 * - `Segmenter`: target-language and foreign spans that partition the text
 * - `PhraseChunker`: phrase candidates reconciled to segment offsets
 * - `TranslationPort`: the backend boundary, wrapped by per-chunk fallbacks
 * - `AnnotationPipeline`: phases, bounded windows, metrics and cancellation
 */

pub mod canonical;
pub mod chunker;
pub mod detector;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod port;
pub mod script;
pub mod segmenter;
pub mod vocabulary;

pub use chunker::{CandidateChunk, HeuristicPhraseSource, PhraseChunker, PhraseSource, reconcile_offsets};
pub use detector::{Detection, DetectionSource, LanguageDetector};
pub use metrics::{ModeCounters, PipelineMetrics};
pub use model::{
    AnnotatedChunk, AnnotationResult, ChunkType, ExtractedText, OffsetAlignment, Phase, PhraseChunk,
    ProgressSnapshot, TextSegment, Translation,
};
pub use orchestrator::AnnotationPipeline;
pub use port::TranslationPort;
pub use segmenter::Segmenter;
pub use vocabulary::{StaticVocabulary, VocabularyLookup};
