/*!
 * Common test utilities for the lexiflow test suite
 */

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use lexiflow::annotation::{CandidateChunk, PhraseSource};
use lexiflow::errors::{ChunkError, PortError};
use lexiflow::TranslationPort;

/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Shared call statistics of a `RecordingPort`
#[derive(Debug, Default)]
pub struct PortStats {
    pub literal_calls: AtomicUsize,
    pub contextual_calls: AtomicUsize,
    pub simplify_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl PortStats {
    pub fn total_calls(&self) -> usize {
        self.literal_calls.load(Ordering::SeqCst)
            + self.contextual_calls.load(Ordering::SeqCst)
            + self.simplify_calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Translation port that records its calls.
///
/// Literal renderings are `lit(<text>)`, contextual ones `ctx(<text>)` and
/// simplifications `simple(<text>)`. Texts listed in `failing` make every
/// call fail with `Unavailable`; texts in `locked` require interaction.
#[derive(Debug, Default)]
pub struct RecordingPort {
    pub stats: Arc<PortStats>,
    failing: Vec<String>,
    locked: Vec<String>,
    delay: Option<Duration>,
    contextual_echoes_literal: bool,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.push(text.to_string());
        self
    }

    pub fn locked_on(mut self, text: &str) -> Self {
        self.locked.push(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make contextual calls return the literal candidate unchanged
    pub fn echoing_literal(mut self) -> Self {
        self.contextual_echoes_literal = true;
        self
    }

    async fn call(&self, text: &str, render: impl FnOnce() -> String) -> Result<String, PortError> {
        self.stats.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = if self.failing.iter().any(|t| t == text) {
            Err(PortError::Unavailable(format!("backend cannot handle '{}'", text)))
        } else if self.locked.iter().any(|t| t == text) {
            Err(PortError::InteractionRequired("user gesture needed".to_string()))
        } else {
            Ok(render())
        };
        self.stats.leave();
        result
    }
}

#[async_trait]
impl TranslationPort for RecordingPort {
    async fn translate_literal(&self, text: &str, _source: &str, _target: &str) -> Result<String, PortError> {
        self.stats.literal_calls.fetch_add(1, Ordering::SeqCst);
        self.call(text, || format!("lit({})", text)).await
    }

    async fn translate_contextual(
        &self,
        text: &str,
        _source: &str,
        _target: &str,
        _context: &str,
        literal_candidate: &str,
    ) -> Result<String, PortError> {
        self.stats.contextual_calls.fetch_add(1, Ordering::SeqCst);
        let echo = self.contextual_echoes_literal;
        self.call(text, || {
            if echo {
                literal_candidate.to_string()
            } else {
                format!("ctx({})", text)
            }
        })
        .await
    }

    async fn simplify(
        &self,
        text: &str,
        _full_context: &str,
        _chunk_start: usize,
        _chunk_end: usize,
    ) -> Result<String, PortError> {
        self.stats.simplify_calls.fetch_add(1, Ordering::SeqCst);
        self.call(text, || format!("simple({})", text)).await
    }
}

/// Phrase source returning a fixed list of candidates for every segment
#[derive(Debug, Clone, Default)]
pub struct FixedPhraseSource {
    phrases: Vec<String>,
}

impl FixedPhraseSource {
    pub fn new(phrases: &[&str]) -> Self {
        Self {
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[async_trait]
impl PhraseSource for FixedPhraseSource {
    async fn propose(&self, _text: &str, _language: &str) -> Result<Vec<CandidateChunk>, ChunkError> {
        Ok(self.phrases.iter().map(CandidateChunk::new).collect())
    }
}

/// Phrase source that always fails
#[derive(Debug, Clone, Default)]
pub struct BrokenPhraseSource;

#[async_trait]
impl PhraseSource for BrokenPhraseSource {
    async fn propose(&self, _text: &str, _language: &str) -> Result<Vec<CandidateChunk>, ChunkError> {
        Err(ChunkError::Failed("model refused".to_string()))
    }
}
