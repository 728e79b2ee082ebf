/*!
 * Translation backend boundary and the per-chunk fallback adapter.
 *
 * `TranslationPort` is implemented outside the pipeline (see
 * `providers::ProviderPort`). The functions here wrap single port calls so that
 * no backend failure ever escapes a chunk:
 * - `InteractionRequired` becomes a bracketed placeholder
 * - any other failure echoes the source text
 * - a literal failure skips the contextual call
 * - a contextual failure keeps the literal
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::time::Instant;

use crate::errors::PortError;

use super::canonical::merge_translations;
use super::metrics::{ChunkUsage, ModeCounters, PortMode};
use super::model::Translation;

/// Backend able to translate and simplify short spans.
///
/// Implementations must be safe to call concurrently; the pipeline keeps at
/// most `batch_width` calls in flight per segment.
#[async_trait]
pub trait TranslationPort: Send + Sync {
    /// Direct, context-free rendering of `text`
    async fn translate_literal(&self, text: &str, source: &str, target: &str) -> Result<String, PortError>;

    /// Rendering of `text` within `context`.
    ///
    /// The backend should echo `literal_candidate` when it is already right in
    /// context.
    async fn translate_contextual(
        &self,
        text: &str,
        source: &str,
        target: &str,
        context: &str,
        literal_candidate: &str,
    ) -> Result<String, PortError>;

    /// Simpler same-language wording of `full_context[chunk_start..chunk_end]`
    async fn simplify(
        &self,
        text: &str,
        full_context: &str,
        chunk_start: usize,
        chunk_end: usize,
    ) -> Result<String, PortError>;
}

/// Translation of one chunk plus the calls it took
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutcome {
    pub translation: Translation,
    pub usage: ChunkUsage,
}

/// Placeholder shown when the backend needs an interactive trigger
pub fn interaction_placeholder(text: &str) -> String {
    format!("[{}]", text)
}

/// Issue one port call, recording its outcome in `counters`
async fn timed_call<F>(counters: &mut ModeCounters, call: F) -> Result<String, PortError>
where
    F: Future<Output = Result<String, PortError>>,
{
    let start = Instant::now();
    counters.calls += 1;
    let result = call.await.and_then(|output| {
        if output.trim().is_empty() {
            Err(PortError::Unavailable("empty response".to_string()))
        } else {
            Ok(output)
        }
    });
    counters.total_time += start.elapsed();

    match &result {
        Ok(_) => counters.successes += 1,
        Err(PortError::InteractionRequired(_)) => counters.interaction_required += 1,
        Err(PortError::Unavailable(_)) => counters.failures += 1,
    }
    result
}

/// Translate one chunk with literal-then-contextual fallback.
///
/// The contextual call is skipped when `context` is the chunk itself.
pub async fn translate_chunk(
    port: &dyn TranslationPort,
    text: &str,
    context: &str,
    source: &str,
    target: &str,
) -> ChunkOutcome {
    let mut usage = ChunkUsage::default();

    let literal = timed_call(usage.counters_mut(PortMode::Literal), port.translate_literal(text, source, target)).await;
    let literal = match literal {
        Ok(literal) => literal,
        Err(PortError::InteractionRequired(reason)) => {
            debug!("Literal translation of '{}' needs interaction: {}", text, reason);
            let placeholder = interaction_placeholder(text);
            return ChunkOutcome {
                translation: Translation::identity(&placeholder),
                usage,
            };
        }
        Err(PortError::Unavailable(reason)) => {
            warn!("Literal translation of '{}' failed, echoing source: {}", text, reason);
            return ChunkOutcome {
                translation: Translation::identity(text),
                usage,
            };
        }
    };

    if context.trim() == text.trim() {
        return ChunkOutcome {
            translation: merge_translations(literal, None),
            usage,
        };
    }

    let contextual = timed_call(
        usage.counters_mut(PortMode::Contextual),
        port.translate_contextual(text, source, target, context, &literal),
    )
    .await;
    let contextual = match contextual {
        Ok(contextual) => Some(contextual),
        Err(e) => {
            debug!("Contextual translation of '{}' failed, keeping literal: {}", text, e);
            None
        }
    };

    ChunkOutcome {
        translation: merge_translations(literal, contextual),
        usage,
    }
}

/// Simplify one chunk in place; both fields carry the simpler wording
pub async fn simplify_chunk(
    port: &dyn TranslationPort,
    text: &str,
    full_context: &str,
    chunk_start: usize,
    chunk_end: usize,
) -> ChunkOutcome {
    let mut usage = ChunkUsage::default();
    let result = timed_call(
        usage.counters_mut(PortMode::Simplify),
        port.simplify(text, full_context, chunk_start, chunk_end),
    )
    .await;

    let translation = match result {
        Ok(simplified) => Translation::identity(simplified.trim()),
        Err(PortError::InteractionRequired(_)) => Translation::identity(&interaction_placeholder(text)),
        Err(PortError::Unavailable(reason)) => {
            warn!("Simplification of '{}' failed, echoing source: {}", text, reason);
            Translation::identity(text)
        }
    };
    ChunkOutcome { translation, usage }
}

/// Text around `[start, end)` limited to `radius` bytes on each side.
///
/// Returns the window and the span's offsets within it. Bounds are moved
/// outward to char boundaries.
pub fn context_window(full: &str, start: usize, end: usize, radius: usize) -> (&str, usize, usize) {
    let end = end.min(full.len());
    let start = start.min(end);

    let mut lo = start.saturating_sub(radius);
    while !full.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = end.saturating_add(radius).min(full.len());
    while !full.is_char_boundary(hi) {
        hi += 1;
    }
    (&full[lo..hi], start - lo, end - lo)
}
