/*!
 * Canonicalization of translated strings and the literal/contextual merge rule.
 *
 * Canonical forms are only used to decide whether two renderings are
 * equivalent; they are never shown.
 */

use std::collections::HashMap;
use std::sync::LazyLock;

use super::model::Translation;

/// Word-level synonyms folded onto one spelling.
///
/// No value may appear as a key, which keeps `canonicalize` idempotent.
static SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("hello", "hi"),
        ("hey", "hi"),
        ("ok", "okay"),
        ("k", "okay"),
        ("yeah", "yes"),
        ("yep", "yes"),
        ("nope", "no"),
        ("thanks", "thank"),
        ("thx", "thank"),
        ("colour", "color"),
        ("favourite", "favorite"),
        ("grey", "gray"),
        ("u", "you"),
        ("ur", "your"),
    ])
});

/// Normalize a string for equivalence checks.
///
/// Steps: trim, keep the first of slash-delimited alternatives, lowercase,
/// strip punctuation and symbols, collapse whitespace, fold synonyms.
pub fn canonicalize(text: &str) -> String {
    let first_alternative = text.trim().split('/').next().unwrap_or_default();
    let lowered = first_alternative.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    stripped
        .split_whitespace()
        .map(|word| SYNONYMS.get(word).copied().unwrap_or(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two renderings are equivalent after canonicalization
pub fn equivalent(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}

/// Merge a literal rendering with an optional contextual one.
///
/// An equivalent (or missing) contextual rendering is discarded and the
/// literal is used for both fields.
pub fn merge_translations(literal: String, contextual: Option<String>) -> Translation {
    match contextual {
        Some(contextual) if !contextual.trim().is_empty() && !equivalent(&literal, &contextual) => {
            Translation {
                literal,
                contextual,
                differs: true,
            }
        }
        _ => Translation {
            contextual: literal.clone(),
            literal,
            differs: false,
        },
    }
}
