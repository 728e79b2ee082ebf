/*!
 * Data model for the annotation pipeline.
 *
 * All offsets are byte offsets into UTF-8 text and always fall on `char`
 * boundaries, so `&text[start..end]` is valid for every segment and chunk.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::metrics::PipelineMetrics;

static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(?:br|/p|/div|/li|/h[1-6]|/tr|/blockquote|/section|/article)\b[^>]*>")
        .expect("invalid block tag pattern")
});

static ANY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<[a-zA-Z/!][^>]*>")
        .expect("invalid tag pattern")
});

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>")
        .expect("invalid script pattern")
});

/// Text delivered by the external extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Markup or plain text
    pub content: String,
    /// Language declared by the source document, if any
    #[serde(default)]
    pub declared_language: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub byline: Option<String>,
}

impl ExtractedText {
    /// Wrap plain text without metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the declared language
    pub fn with_declared_language(mut self, language: impl Into<String>) -> Self {
        self.declared_language = Some(language.into());
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Plain-text form of the content.
    ///
    /// Content without markup is returned unchanged. Otherwise scripts and
    /// styles are dropped, block-closing tags become newlines, remaining tags
    /// are removed and basic entities decoded.
    pub fn plain_text(&self) -> String {
        if !self.content.contains('<') && !self.content.contains('&') {
            return self.content.clone();
        }
        let without_code = SCRIPT_OR_STYLE.replace_all(&self.content, "");
        let with_breaks = BLOCK_TAG.replace_all(&without_code, "\n");
        let stripped = ANY_TAG.replace_all(&with_breaks, "");
        decode_entities(&stripped)
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// A contiguous span of the plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Written in the document's detected language (as opposed to foreign text or separators)
    pub is_target_language: bool,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, start: usize, is_target_language: bool) -> Self {
        let text = text.into();
        let end = start + text.len();
        Self {
            text,
            start,
            end,
            is_target_language,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Phrase category assigned by the chunker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// A single word
    Word,
    NounPhrase,
    VerbPhrase,
    PrepositionalPhrase,
    /// Any other multi-word unit
    Phrase,
    /// A non-target segment passed through untouched
    Foreign,
}

/// How a chunk's offsets were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetAlignment {
    /// Found at or after the reconciliation cursor
    #[default]
    Exact,
    /// Found only by searching the whole segment
    Relocated,
    /// Not found; offsets estimated from the cursor and text length
    Approximate,
}

impl OffsetAlignment {
    /// Whether the offsets point at the chunk text verbatim
    pub fn is_precise(self) -> bool {
        !matches!(self, OffsetAlignment::Approximate)
    }
}

/// A phrase unit within one segment, offsets relative to the segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseChunk {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub chunk_type: ChunkType,
    pub alignment: OffsetAlignment,
}

/// Literal and contextual renderings of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub literal: String,
    pub contextual: String,
    /// True only when the canonical forms of both renderings disagree
    pub differs: bool,
}

impl Translation {
    /// Both renderings equal to `text`
    pub fn identity(text: &str) -> Self {
        Self {
            literal: text.to_string(),
            contextual: text.to_string(),
            differs: false,
        }
    }
}

/// A chunk lifted to document offsets with its translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedChunk {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub chunk_type: ChunkType,
    pub alignment: OffsetAlignment,
    pub translation: Translation,
    /// Language of the chunk text, when known
    pub language: Option<String>,
    /// Learner's level for this word, from the vocabulary store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_level: Option<u8>,
}

impl AnnotatedChunk {
    /// Lift a segment-relative chunk to global offsets
    pub fn from_phrase(
        segment: &TextSegment,
        chunk: &PhraseChunk,
        translation: Translation,
        language: Option<String>,
    ) -> Self {
        Self {
            text: chunk.text.clone(),
            start: segment.start + chunk.start,
            end: segment.start + chunk.end,
            chunk_type: chunk.chunk_type,
            alignment: chunk.alignment,
            translation,
            language,
            known_level: None,
        }
    }

    /// A whole segment as one chunk whose translation mirrors the text
    pub fn passthrough(segment: &TextSegment, chunk_type: ChunkType, language: Option<String>) -> Self {
        Self {
            text: segment.text.clone(),
            start: segment.start,
            end: segment.end,
            chunk_type,
            alignment: OffsetAlignment::Exact,
            translation: Translation::identity(&segment.text),
            language,
            known_level: None,
        }
    }
}

/// Final output of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationResult {
    pub plain_text: String,
    pub chunks: Vec<AnnotatedChunk>,
    pub detected_language: String,
    /// Source and target language coincide; chunks carry simplifications
    pub simplify_mode: bool,
    pub metrics: PipelineMetrics,
}

/// Pipeline phases, entered once each in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Extract,
    Detect,
    Segment,
    Prechunk,
    Translate,
    Simplify,
    Finalize,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Extract => "extract",
            Phase::Detect => "detect",
            Phase::Segment => "segment",
            Phase::Prechunk => "prechunk",
            Phase::Translate => "translate",
            Phase::Simplify => "simplify",
            Phase::Finalize => "finalize",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time report emitted during a run
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// Frozen copy of every chunk accumulated so far
    pub chunks: Vec<AnnotatedChunk>,
    pub is_complete: bool,
    /// Provisional until the prechunk phase has settled
    pub total_expected_chunks: Option<usize>,
    pub phase: Phase,
    pub metrics: PipelineMetrics,
}
