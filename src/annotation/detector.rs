/*!
 * Language detection with layered fallback.
 *
 * The detector tries, in order:
 * 1. the language declared by the source document, normalized to a canonical code
 * 2. statistical detection over the text (whatlang)
 * 3. the dominant Unicode script of the text
 *
 * When every layer fails the caller decides what to substitute; the
 * orchestrator uses the target language and records `DetectionSource::Fallback`.
 */

use log::debug;
use serde::Serialize;

use crate::language_utils::normalize_language_tag;

use super::script::dominant_script_language;

/// Which layer produced the detected language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Declared,
    Statistical,
    ScriptHeuristic,
    /// Nothing matched; the target language was substituted
    Fallback,
}

/// A detected language and where it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// Canonical language code
    pub language: String,
    pub source: DetectionSource,
    /// 1.0 for declared languages, detector confidence otherwise
    pub confidence: f64,
}

/// Layered language detector
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    /// Statistical results below this confidence are rejected
    min_confidence: f64,
    /// Texts shorter than this (in chars) skip statistical detection
    min_statistical_chars: usize,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            min_statistical_chars: 12,
        }
    }
}

impl LanguageDetector {
    /// Create a detector with a custom confidence threshold
    pub fn new(min_confidence: f64) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Detect the dominant language of `text`, honoring a declared tag first
    pub fn detect(&self, text: &str, declared: Option<&str>) -> Option<Detection> {
        if let Some(tag) = declared {
            if let Some(language) = normalize_language_tag(tag) {
                debug!("Using declared language '{}' ({})", language, tag);
                return Some(Detection {
                    language,
                    source: DetectionSource::Declared,
                    confidence: 1.0,
                });
            }
            debug!("Ignoring unrecognized declared language '{}'", tag);
        }

        if let Some(detection) = self.detect_statistical(text) {
            return Some(detection);
        }

        dominant_script_language(text).map(|language| Detection {
            language: language.to_string(),
            source: DetectionSource::ScriptHeuristic,
            confidence: 0.0,
        })
    }

    /// Statistical detection only, without the script fallback
    pub fn detect_statistical(&self, text: &str) -> Option<Detection> {
        if text.chars().filter(|c| c.is_alphabetic()).count() < self.min_statistical_chars {
            return None;
        }
        let info = whatlang::detect(text)?;
        if !info.is_reliable() || info.confidence() < self.min_confidence {
            debug!(
                "Statistical detection unreliable: {:?} at {:.2}",
                info.lang(),
                info.confidence()
            );
            return None;
        }
        let language = normalize_language_tag(info.lang().code())?;
        Some(Detection {
            language,
            source: DetectionSource::Statistical,
            confidence: info.confidence(),
        })
    }

    /// Best-effort language tag for a short foreign span
    pub fn tag_span(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        self.detect(text, None).map(|d| d.language)
    }
}
