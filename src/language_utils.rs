//! Language utilities for ISO language code handling
//!
//! Normalization and matching of ISO 639-1 (2-letter), ISO 639-2
//! (3-letter) and BCP-47-style language tags. Canonical codes are ISO 639-1
//! where one exists and ISO 639-2/T otherwise.

use anyhow::{Result, anyhow};
use isolang::Language;
use std::collections::HashMap;
use std::sync::LazyLock;

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
static BIBLIOGRAPHIC_CODES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("fre", "fra"),
        ("ger", "deu"),
        ("dut", "nld"),
        ("gre", "ell"),
        ("chi", "zho"),
        ("cze", "ces"),
        ("ice", "isl"),
        ("alb", "sqi"),
        ("arm", "hye"),
        ("baq", "eus"),
        ("bur", "mya"),
        ("per", "fas"),
        ("geo", "kat"),
        ("may", "msa"),
        ("mac", "mkd"),
        ("rum", "ron"),
        ("slo", "slk"),
        ("wel", "cym"),
        ("tib", "bod"),
    ])
});

/// Display names, dialect tags and script variants mapped to canonical codes.
///
/// Anything not listed falls back to its primary subtag, validated against ISO 639.
static LANGUAGE_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Chinese family
        ("chinese", "zh"),
        ("mandarin", "zh"),
        ("cmn", "zh"),
        ("zh-cn", "zh"),
        ("zh-tw", "zh"),
        ("zh-hk", "zh"),
        ("zh-sg", "zh"),
        ("zh-hans", "zh"),
        ("zh-hant", "zh"),
        ("simplified chinese", "zh"),
        ("traditional chinese", "zh"),
        ("cantonese", "yue"),
        // English
        ("english", "en"),
        ("en-us", "en"),
        ("en-gb", "en"),
        ("en-au", "en"),
        ("en-ca", "en"),
        // Romance
        ("french", "fr"),
        ("français", "fr"),
        ("spanish", "es"),
        ("español", "es"),
        ("castilian", "es"),
        ("portuguese", "pt"),
        ("português", "pt"),
        ("pt-br", "pt"),
        ("pt-pt", "pt"),
        ("italian", "it"),
        ("romanian", "ro"),
        ("catalan", "ca"),
        // Germanic
        ("german", "de"),
        ("deutsch", "de"),
        ("dutch", "nl"),
        ("flemish", "nl"),
        ("swedish", "sv"),
        ("norwegian", "no"),
        ("nb", "no"),
        ("nn", "no"),
        ("danish", "da"),
        // Slavic and others
        ("russian", "ru"),
        ("ukrainian", "uk"),
        ("polish", "pl"),
        ("czech", "cs"),
        ("greek", "el"),
        ("turkish", "tr"),
        ("arabic", "ar"),
        ("hebrew", "he"),
        ("iw", "he"),
        ("persian", "fa"),
        ("farsi", "fa"),
        // Iranian Persian as reported by statistical detection
        ("pes", "fa"),
        ("hindi", "hi"),
        ("bengali", "bn"),
        ("bangla", "bn"),
        ("georgian", "ka"),
        ("armenian", "hy"),
        // East and South-East Asia
        ("japanese", "ja"),
        ("日本語", "ja"),
        ("korean", "ko"),
        ("한국어", "ko"),
        ("thai", "th"),
        ("vietnamese", "vi"),
        ("indonesian", "id"),
        ("in", "id"),
        ("malay", "ms"),
        ("khmer", "km"),
        ("lao", "lo"),
        ("burmese", "my"),
        ("tibetan", "bo"),
        ("中文", "zh"),
    ])
});

/// Languages written without spaces between words
static LOGOGRAPHIC_LANGUAGES: &[&str] = &["zh", "yue", "ja", "th", "lo", "km", "my", "bo"];

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(part2t) = BIBLIOGRAPHIC_CODES.get(normalized_code.as_str()) {
            return Ok((*part2t).to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang.to_639_1().map(str::to_string).unwrap_or(part2t))
}

/// Normalize any language tag to a canonical code.
///
/// Accepts ISO codes, BCP-47 tags (`en-US`, `zh_Hant_TW`) and common display
/// names. Lookup order is the alias table, then the primary subtag validated
/// against ISO 639. Returns `None` when nothing matches.
pub fn normalize_language_tag(tag: &str) -> Option<String> {
    let cleaned = tag.trim().to_lowercase().replace('_', "-");
    if cleaned.is_empty() {
        return None;
    }

    if let Some(code) = LANGUAGE_ALIASES.get(cleaned.as_str()) {
        return Some((*code).to_string());
    }

    // Try progressively shorter subtag prefixes: zh-hant-tw -> zh-hant -> zh
    let subtags: Vec<&str> = cleaned.split('-').collect();
    for len in (1..subtags.len()).rev() {
        let prefix = subtags[..len].join("-");
        if let Some(code) = LANGUAGE_ALIASES.get(prefix.as_str()) {
            return Some((*code).to_string());
        }
    }

    let primary = subtags.first()?;
    normalize_to_part1_or_part2t(primary)
        .ok()
        .map(|code| LANGUAGE_ALIASES.get(code.as_str()).map_or(code, |alias| (*alias).to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_language_tag(code1), normalize_language_tag(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Whether the language is written without whitespace between words
pub fn is_logographic_language(code: &str) -> bool {
    normalize_language_tag(code)
        .map(|c| LOGOGRAPHIC_LANGUAGES.contains(&c.as_str()))
        .unwrap_or(false)
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let canonical = normalize_language_tag(code)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    let normalized = normalize_to_part2t(&canonical)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}
