/*!
 * # Lexiflow - progressive phrase annotation for language learners
 *
 * A Rust library that turns extracted document text into small, ordered
 * chunks with document offsets and translations, streamed as they complete.
 *
 * ## Features
 *
 * - Language detection with declared, statistical and script fallbacks
 * - Script-aware segmentation (character runs for CJK and other spaceless scripts)
 * - Phrase chunking with offset reconciliation
 * - Literal and contextual translation, or simplification when the document
 *   is already in the target language
 * - Bounded-concurrency batches, cancellation and progress snapshots
 * - ISO 639-1, ISO 639-2 and BCP-47 language tag support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `annotation`: The pipeline and its components:
 *   - `annotation::detector`: Language detection
 *   - `annotation::segmenter`: Target/foreign segmentation
 *   - `annotation::chunker`: Phrase chunking and offset reconciliation
 *   - `annotation::port`: Translation backend boundary and fallbacks
 *   - `annotation::orchestrator`: Phase driver
 * - `providers`: LLM clients and the provider-backed translation port:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::session`: Bounded session pool
 * - `app_config`: Configuration management
 * - `language_utils`: Language code utilities
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod annotation;
pub mod app_config;
pub mod errors;
pub mod language_utils;
pub mod providers;

// Re-export main types for easier usage
pub use annotation::{
    AnnotatedChunk, AnnotationPipeline, AnnotationResult, ExtractedText, Phase, ProgressSnapshot,
    TranslationPort,
};
pub use app_config::{Config, PipelineConfig, ProviderConfig};
pub use errors::{AnnotationError, ChunkError, PortError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_language_tag};
pub use tokio_util::sync::CancellationToken;
