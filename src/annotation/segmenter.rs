/*!
 * Script-aware segmentation.
 *
 * Splits plain text into contiguous segments tagged as written in the
 * document language or not. Logographic languages are walked character by
 * character; other languages are split into words and whitespace runs.
 *
 * Neutral tokens (whitespace, punctuation, digits) sitting between two tokens
 * of the same class join that run. Any other neutral run becomes its own
 * non-target separator segment. Segments always concatenate back to the input.
 */

use crate::language_utils::{is_logographic_language, normalize_language_tag};

use super::model::TextSegment;
use super::script::classify_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Target,
    Foreign,
    Separator,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    /// `None` for neutral tokens, resolved before grouping
    class: Option<TokenClass>,
}

/// Splits text into target-language and foreign segments
#[derive(Debug, Clone, Default)]
pub struct Segmenter;

impl Segmenter {
    pub fn new() -> Self {
        Self
    }

    /// Segment `text` for the given document language
    pub fn segment(&self, text: &str, language: &str) -> Vec<TextSegment> {
        if text.is_empty() {
            return Vec::new();
        }
        let language = normalize_language_tag(language).unwrap_or_else(|| language.to_string());

        let mut tokens = if is_logographic_language(&language) {
            char_tokens(text, &language)
        } else {
            word_tokens(text, &language)
        };
        resolve_neutral_runs(&mut tokens);
        group_tokens(text, &tokens)
    }
}

/// One token per character
fn char_tokens(text: &str, language: &str) -> Vec<Token> {
    text.char_indices()
        .map(|(start, ch)| Token {
            start,
            end: start + ch.len_utf8(),
            class: classify_char(ch, language).map(target_class),
        })
        .collect()
}

/// Alternating runs of whitespace and non-whitespace
fn word_tokens(text: &str, language: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut run_start = 0;
    let mut run_is_space: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match run_is_space {
            Some(prev) if prev == is_space => {}
            Some(_) => {
                tokens.push(word_token(text, run_start, idx, language));
                run_start = idx;
            }
            None => {}
        }
        run_is_space = Some(is_space);
    }
    tokens.push(word_token(text, run_start, text.len(), language));
    tokens
}

/// Classify a word by the majority script of its letters
fn word_token(text: &str, start: usize, end: usize, language: &str) -> Token {
    let mut target = 0usize;
    let mut foreign = 0usize;
    for ch in text[start..end].chars() {
        match classify_char(ch, language) {
            Some(true) => target += 1,
            Some(false) => foreign += 1,
            None => {}
        }
    }
    let class = if target + foreign == 0 {
        None
    } else {
        Some(target_class(target >= foreign))
    };
    Token { start, end, class }
}

fn target_class(is_target: bool) -> TokenClass {
    if is_target {
        TokenClass::Target
    } else {
        TokenClass::Foreign
    }
}

/// Give each maximal run of neutral tokens a class
fn resolve_neutral_runs(tokens: &mut [Token]) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].class.is_some() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < tokens.len() && tokens[i].class.is_none() {
            i += 1;
        }
        let before = run_start.checked_sub(1).and_then(|j| tokens[j].class);
        let after = tokens.get(i).and_then(|t| t.class);
        let class = match (before, after) {
            (Some(b), Some(a)) if a == b => b,
            _ => TokenClass::Separator,
        };
        for token in &mut tokens[run_start..i] {
            token.class = Some(class);
        }
    }
}

/// Merge consecutive tokens of the same class into segments
fn group_tokens(text: &str, tokens: &[Token]) -> Vec<TextSegment> {
    let mut segments: Vec<TextSegment> = Vec::new();
    let mut current: Option<(usize, usize, TokenClass)> = None;

    for token in tokens {
        let class = token.class.unwrap_or(TokenClass::Separator);
        current = match current {
            Some((start, _, c)) if c == class => Some((start, token.end, c)),
            Some((start, end, c)) => {
                segments.push(TextSegment::new(&text[start..end], start, c == TokenClass::Target));
                Some((token.start, token.end, class))
            }
            None => Some((token.start, token.end, class)),
        };
    }
    if let Some((start, end, c)) = current {
        segments.push(TextSegment::new(&text[start..end], start, c == TokenClass::Target));
    }
    segments
}
