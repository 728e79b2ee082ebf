/*!
 * Phrase chunking and offset reconciliation.
 *
 * A `PhraseSource` proposes candidate phrases for a segment (text only, in
 * order). `reconcile_offsets` then locates each candidate in the segment:
 *
 * 1. search from a monotonic cursor; a hit advances the cursor
 * 2. retry from the cursor ignoring case and whitespace differences
 * 3. search the whole segment without moving the cursor (`Relocated`)
 * 4. estimate offsets from the cursor and candidate length (`Approximate`)
 *
 * The heuristic source splits at clause punctuation and function words. It is
 * a phrase splitter, not a parser.
 */

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;

use crate::errors::ChunkError;
use crate::language_utils::{is_logographic_language, normalize_language_tag};

use super::model::{ChunkType, OffsetAlignment, PhraseChunk};

/// A proposed phrase before offsets are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateChunk {
    pub text: String,
    /// Category if the source knows it; classified heuristically otherwise
    pub chunk_type: Option<ChunkType>,
}

impl CandidateChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chunk_type: None,
        }
    }
}

/// Proposes phrase candidates for a segment
#[async_trait]
pub trait PhraseSource: Send + Sync {
    /// Split `text` into candidate phrases, in reading order
    async fn propose(&self, text: &str, language: &str) -> Result<Vec<CandidateChunk>, ChunkError>;
}

/// Closed-class words used to break and classify phrases
struct FunctionWords {
    determiners: &'static [&'static str],
    prepositions: &'static [&'static str],
    conjunctions: &'static [&'static str],
    auxiliaries: &'static [&'static str],
}

static FUNCTION_WORDS: LazyLock<HashMap<&'static str, FunctionWords>> = LazyLock::new(|| {
    HashMap::from([
        (
            "en",
            FunctionWords {
                determiners: &["the", "a", "an", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our", "their"],
                prepositions: &["in", "on", "at", "to", "for", "with", "from", "by", "of", "about", "into", "over", "under", "after", "before", "between", "through", "during", "without"],
                conjunctions: &["and", "but", "or", "because", "so", "while", "when", "if", "although", "which", "who"],
                auxiliaries: &["is", "are", "was", "were", "be", "been", "will", "would", "can", "could", "should", "must", "has", "have", "had", "do", "does", "did"],
            },
        ),
        (
            "fr",
            FunctionWords {
                determiners: &["le", "la", "les", "un", "une", "des", "ce", "cette", "ces", "mon", "ma", "mes", "son", "sa", "ses"],
                prepositions: &["à", "de", "du", "dans", "sur", "sous", "avec", "pour", "par", "sans", "chez", "entre", "vers", "pendant"],
                conjunctions: &["et", "mais", "ou", "donc", "car", "que", "qui", "quand", "si", "parce"],
                auxiliaries: &["est", "sont", "était", "a", "ont", "avait", "sera", "va", "peut", "doit"],
            },
        ),
        (
            "es",
            FunctionWords {
                determiners: &["el", "la", "los", "las", "un", "una", "unos", "unas", "este", "esta", "mi", "su"],
                prepositions: &["a", "de", "del", "en", "con", "por", "para", "sin", "sobre", "entre", "desde", "hasta"],
                conjunctions: &["y", "pero", "o", "porque", "que", "cuando", "si", "aunque"],
                auxiliaries: &["es", "son", "era", "está", "están", "ha", "han", "había", "va", "puede"],
            },
        ),
        (
            "de",
            FunctionWords {
                determiners: &["der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "mein", "sein", "ihr"],
                prepositions: &["in", "im", "an", "am", "auf", "mit", "nach", "bei", "von", "vom", "zu", "zum", "zur", "für", "über", "unter", "durch", "ohne"],
                conjunctions: &["und", "aber", "oder", "weil", "dass", "wenn", "als", "ob", "denn"],
                auxiliaries: &["ist", "sind", "war", "waren", "hat", "haben", "hatte", "wird", "werden", "kann", "muss"],
            },
        ),
    ])
});

fn is_clause_break(ch: char) -> bool {
    matches!(
        ch,
        ',' | ';' | ':' | '.' | '!' | '?' | '(' | ')' | '[' | ']' | '"' | '“' | '”' | '«' | '»'
            | '，' | '。' | '；' | '：' | '！' | '？' | '、' | '（' | '）' | '「' | '」' | '『' | '』'
            | '…' | '—' | '–' | '\n'
    )
}

/// Byte spans of the clauses in `text`, trimmed and non-empty
fn clause_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if is_clause_break(ch) {
            push_trimmed(text, start, idx, &mut spans);
            start = idx + ch.len_utf8();
        }
    }
    push_trimmed(text, start, text.len(), &mut spans);
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if !trimmed.is_empty() {
        let s = start + leading;
        spans.push((s, s + trimmed.len()));
    }
}

/// Byte spans of whitespace-separated words within `text`
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut word_start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), word_start) {
            (true, Some(s)) => {
                spans.push((s, idx));
                word_start = None;
            }
            (false, None) => word_start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = word_start {
        spans.push((s, text.len()));
    }
    spans
}

fn bare_lower(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// Rule-based phrase splitter
#[derive(Debug, Clone)]
pub struct HeuristicPhraseSource {
    /// Maximum words per phrase in spaced languages
    max_phrase_words: usize,
    /// Maximum characters per piece in logographic languages
    max_logographic_run: usize,
}

impl Default for HeuristicPhraseSource {
    fn default() -> Self {
        Self {
            max_phrase_words: 4,
            max_logographic_run: 6,
        }
    }
}

impl HeuristicPhraseSource {
    pub fn new(max_phrase_words: usize, max_logographic_run: usize) -> Self {
        Self {
            max_phrase_words: max_phrase_words.max(1),
            max_logographic_run: max_logographic_run.max(1),
        }
    }

    /// Split synchronously; the async trait method delegates here
    pub fn split(&self, text: &str, language: &str) -> Vec<CandidateChunk> {
        let language = normalize_language_tag(language).unwrap_or_else(|| language.to_string());
        let logographic = is_logographic_language(&language);
        let words = FUNCTION_WORDS.get(language.as_str());

        let mut candidates = Vec::new();
        for (cs, ce) in clause_spans(text) {
            let clause = &text[cs..ce];
            if logographic {
                self.split_logographic(clause, &mut candidates);
            } else {
                self.split_spaced(clause, words, &mut candidates);
            }
        }
        candidates
    }

    fn split_spaced(&self, clause: &str, words: Option<&FunctionWords>, out: &mut Vec<CandidateChunk>) {
        let spans = word_spans(clause);
        let mut phrase: Vec<(usize, usize)> = Vec::new();

        for span in spans {
            let word = bare_lower(&clause[span.0..span.1]);
            let breaks_before = words
                .map(|w| w.prepositions.contains(&word.as_str()) || w.conjunctions.contains(&word.as_str()))
                .unwrap_or(false);
            if !phrase.is_empty() && (phrase.len() >= self.max_phrase_words || breaks_before) {
                out.push(build_spaced_candidate(clause, &phrase, words));
                phrase.clear();
            }
            phrase.push(span);
        }
        if !phrase.is_empty() {
            out.push(build_spaced_candidate(clause, &phrase, words));
        }
    }

    fn split_logographic(&self, clause: &str, out: &mut Vec<CandidateChunk>) {
        let chars: Vec<char> = clause.chars().filter(|c| !c.is_whitespace()).collect();
        for piece in chars.chunks(self.max_logographic_run) {
            let text: String = piece.iter().collect();
            let chunk_type = if piece.len() <= 2 { ChunkType::Word } else { ChunkType::Phrase };
            out.push(CandidateChunk {
                text,
                chunk_type: Some(chunk_type),
            });
        }
    }
}

fn build_spaced_candidate(clause: &str, phrase: &[(usize, usize)], words: Option<&FunctionWords>) -> CandidateChunk {
    let start = phrase.first().map(|s| s.0).unwrap_or(0);
    let end = phrase.last().map(|s| s.1).unwrap_or(start);
    let text = &clause[start..end];
    let chunk_type = if phrase.len() == 1 {
        ChunkType::Word
    } else {
        classify_phrase(&bare_lower(&clause[phrase[0].0..phrase[0].1]), words)
    };
    CandidateChunk {
        text: text.to_string(),
        chunk_type: Some(chunk_type),
    }
}

fn classify_phrase(leading: &str, words: Option<&FunctionWords>) -> ChunkType {
    let Some(words) = words else {
        return ChunkType::Phrase;
    };
    if words.prepositions.contains(&leading) {
        ChunkType::PrepositionalPhrase
    } else if words.determiners.contains(&leading) {
        ChunkType::NounPhrase
    } else if words.auxiliaries.contains(&leading) {
        ChunkType::VerbPhrase
    } else {
        ChunkType::Phrase
    }
}

/// Type for candidates that arrive without one
fn infer_type(text: &str) -> ChunkType {
    if text.split_whitespace().count() <= 1 {
        ChunkType::Word
    } else {
        ChunkType::Phrase
    }
}

#[async_trait]
impl PhraseSource for HeuristicPhraseSource {
    async fn propose(&self, text: &str, language: &str) -> Result<Vec<CandidateChunk>, ChunkError> {
        Ok(self.split(text, language))
    }
}

/// Largest char boundary not above `index`
fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Find `needle` in `haystack` at or after `from`, ignoring case and treating
/// any whitespace run as equal to any other. Returns the matched byte range.
fn tolerant_find(haystack: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }
    let from = floor_char_boundary(haystack, from);
    haystack[from..]
        .char_indices()
        .map(|(i, _)| from + i)
        .find_map(|start| tolerant_match_at(haystack, needle, start).map(|end| (start, end)))
}

fn tolerant_match_at(haystack: &str, needle: &str, start: usize) -> Option<usize> {
    let mut hay = haystack[start..].char_indices().peekable();
    let mut pins = needle.chars().peekable();
    let mut end = start;

    while let Some(n) = pins.next() {
        if n.is_whitespace() {
            while pins.peek().is_some_and(|c| c.is_whitespace()) {
                pins.next();
            }
            let mut matched_space = false;
            while let Some(&(i, h)) = hay.peek() {
                if !h.is_whitespace() {
                    break;
                }
                matched_space = true;
                end = start + i + h.len_utf8();
                hay.next();
            }
            if !matched_space {
                return None;
            }
            continue;
        }
        let (i, h) = hay.next()?;
        if !h.to_lowercase().eq(n.to_lowercase()) {
            return None;
        }
        end = start + i + h.len_utf8();
    }
    Some(end)
}

/// Locate each candidate in `segment` and assign segment-relative offsets.
///
/// Empty and whitespace-only candidates are dropped. The output is sorted by
/// start offset (stable, so equal starts keep candidate order).
pub fn reconcile_offsets(segment: &str, candidates: Vec<CandidateChunk>) -> Vec<PhraseChunk> {
    let mut cursor = 0usize;
    let mut chunks = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if candidate.text.trim().is_empty() {
            continue;
        }
        let chunk_type = candidate.chunk_type.unwrap_or_else(|| infer_type(&candidate.text));
        let text = candidate.text;

        if let Some(pos) = segment[cursor..].find(&text) {
            let start = cursor + pos;
            let end = start + text.len();
            cursor = end;
            chunks.push(PhraseChunk { text, start, end, chunk_type, alignment: OffsetAlignment::Exact });
            continue;
        }

        if let Some((start, end)) = tolerant_find(segment, &text, cursor) {
            cursor = end;
            chunks.push(PhraseChunk {
                text: segment[start..end].to_string(),
                start,
                end,
                chunk_type,
                alignment: OffsetAlignment::Exact,
            });
            continue;
        }

        let relocated = segment
            .find(&text)
            .map(|start| (start, start + text.len()))
            .or_else(|| tolerant_find(segment, &text, 0));
        if let Some((start, end)) = relocated {
            debug!("Chunk '{}' relocated to {}..{}", text, start, end);
            chunks.push(PhraseChunk {
                text: segment[start..end].to_string(),
                start,
                end,
                chunk_type,
                alignment: OffsetAlignment::Relocated,
            });
            continue;
        }

        let start = floor_char_boundary(segment, cursor);
        let end = floor_char_boundary(segment, start + text.len()).max(start);
        debug!("Chunk '{}' not found; approximating {}..{}", text, start, end);
        chunks.push(PhraseChunk { text, start, end, chunk_type, alignment: OffsetAlignment::Approximate });
    }

    chunks.sort_by_key(|c| c.start);
    chunks
}

/// Chunks one segment: proposes candidates, then reconciles offsets
#[derive(Clone)]
pub struct PhraseChunker {
    source: Arc<dyn PhraseSource>,
}

impl Default for PhraseChunker {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicPhraseSource::default()))
    }
}

impl PhraseChunker {
    pub fn new(source: Arc<dyn PhraseSource>) -> Self {
        Self { source }
    }

    /// Chunk a segment, checking for cancellation before and after the source call
    pub async fn chunk(
        &self,
        segment_text: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PhraseChunk>, ChunkError> {
        if cancel.is_cancelled() {
            return Err(ChunkError::Cancelled);
        }
        let candidates = self.source.propose(segment_text, language).await?;
        if cancel.is_cancelled() {
            return Err(ChunkError::Cancelled);
        }
        Ok(reconcile_offsets(segment_text, candidates))
    }
}
