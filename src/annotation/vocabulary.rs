/*!
 * Read-only lookup of a learner's known words.
 */

use std::collections::HashMap;

use crate::language_utils::normalize_language_tag;

/// Source of per-word familiarity levels
pub trait VocabularyLookup: Send + Sync {
    /// Level recorded for `word` in `language`, if any
    fn known_word_level(&self, word: &str, language: &str) -> Option<u8>;
}

/// In-memory vocabulary keyed by language and lowercased word
#[derive(Debug, Clone, Default)]
pub struct StaticVocabulary {
    entries: HashMap<(String, String), u8>,
}

impl StaticVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a level; later inserts for the same word win
    pub fn insert(&mut self, word: &str, language: &str, level: u8) {
        self.entries.insert(Self::key(word, language), level);
    }

    pub fn with_word(mut self, word: &str, language: &str, level: u8) -> Self {
        self.insert(word, language, level);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(word: &str, language: &str) -> (String, String) {
        let language = normalize_language_tag(language).unwrap_or_else(|| language.to_lowercase());
        (language, word.trim().to_lowercase())
    }
}

impl VocabularyLookup for StaticVocabulary {
    fn known_word_level(&self, word: &str, language: &str) -> Option<u8> {
        self.entries.get(&Self::key(word, language)).copied()
    }
}
