/*!
 * Unicode script classification.
 *
 * Range tables used by the segmenter (is this character in the document's
 * script?) and by the detector's last-resort heuristic (which script dominates?).
 */

use std::collections::HashMap;

/// Writing systems the pipeline distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Devanagari,
    Thai,
    Lao,
    Khmer,
    Myanmar,
    Tibetan,
    Armenian,
    Georgian,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Sinhala,
    Ethiopic,
    Han,
    Kana,
    Hangul,
    /// Whitespace, punctuation, digits, symbols
    Neutral,
    /// Letters outside every table above
    Other,
}

impl Script {
    /// Classify a single character
    pub fn of(ch: char) -> Self {
        if !ch.is_alphabetic() {
            return Script::Neutral;
        }
        let u = ch as u32;
        if is_han(u) {
            Script::Han
        } else if is_kana(u) {
            Script::Kana
        } else if is_hangul(u) {
            Script::Hangul
        } else if ch.is_ascii_alphabetic()
            || (0x00C0..=0x024F).contains(&u)
            || (0x1E00..=0x1EFF).contains(&u)
        {
            Script::Latin
        } else if (0x0400..=0x052F).contains(&u) {
            Script::Cyrillic
        } else if (0x0370..=0x03FF).contains(&u) || (0x1F00..=0x1FFF).contains(&u) {
            Script::Greek
        } else if (0x0600..=0x06FF).contains(&u) || (0x0750..=0x077F).contains(&u) {
            Script::Arabic
        } else if (0x0590..=0x05FF).contains(&u) {
            Script::Hebrew
        } else if (0x0900..=0x097F).contains(&u) {
            Script::Devanagari
        } else if (0x0E00..=0x0E7F).contains(&u) {
            Script::Thai
        } else if (0x0E80..=0x0EFF).contains(&u) {
            Script::Lao
        } else if (0x1780..=0x17FF).contains(&u) {
            Script::Khmer
        } else if (0x1000..=0x109F).contains(&u) {
            Script::Myanmar
        } else if (0x0F00..=0x0FFF).contains(&u) {
            Script::Tibetan
        } else if let Some(script) = indic_script(u) {
            script
        } else if (0x0530..=0x058F).contains(&u) || (0xFB13..=0xFB17).contains(&u) {
            Script::Armenian
        } else if (0x10A0..=0x10FF).contains(&u) || (0x2D00..=0x2D2F).contains(&u) || (0x1C90..=0x1CBF).contains(&u) {
            Script::Georgian
        } else if (0x1200..=0x139F).contains(&u) || (0x2D80..=0x2DDF).contains(&u) {
            Script::Ethiopic
        } else {
            Script::Other
        }
    }

    /// The scripts a language is normally written in.
    ///
    /// Unlisted languages accept Latin plus any letter outside the known tables.
    pub fn for_language(code: &str) -> &'static [Script] {
        match code {
            "zh" | "yue" => &[Script::Han],
            "ja" => &[Script::Han, Script::Kana],
            "ko" => &[Script::Hangul, Script::Han],
            "ru" | "uk" | "bg" | "sr" | "mk" | "be" | "kk" | "mn" => &[Script::Cyrillic],
            "el" => &[Script::Greek],
            "ar" | "fa" | "ur" | "ps" => &[Script::Arabic],
            "he" | "yi" => &[Script::Hebrew],
            "hi" | "mr" | "ne" | "sa" => &[Script::Devanagari],
            "th" => &[Script::Thai],
            "lo" => &[Script::Lao],
            "km" => &[Script::Khmer],
            "my" => &[Script::Myanmar],
            "bo" => &[Script::Tibetan],
            "hy" => &[Script::Armenian],
            "ka" => &[Script::Georgian],
            "bn" | "as" => &[Script::Bengali],
            "pa" => &[Script::Gurmukhi],
            "gu" => &[Script::Gujarati],
            "or" => &[Script::Oriya],
            "ta" => &[Script::Tamil],
            "te" => &[Script::Telugu],
            "kn" => &[Script::Kannada],
            "ml" => &[Script::Malayalam],
            "si" => &[Script::Sinhala],
            "am" | "ti" => &[Script::Ethiopic],
            _ => &[Script::Latin, Script::Other],
        }
    }

    /// Most likely language for text dominated by this script
    pub fn default_language(self) -> Option<&'static str> {
        match self {
            Script::Latin => Some("en"),
            Script::Cyrillic => Some("ru"),
            Script::Greek => Some("el"),
            Script::Arabic => Some("ar"),
            Script::Hebrew => Some("he"),
            Script::Devanagari => Some("hi"),
            Script::Thai => Some("th"),
            Script::Lao => Some("lo"),
            Script::Khmer => Some("km"),
            Script::Myanmar => Some("my"),
            Script::Tibetan => Some("bo"),
            Script::Armenian => Some("hy"),
            Script::Georgian => Some("ka"),
            Script::Bengali => Some("bn"),
            Script::Gurmukhi => Some("pa"),
            Script::Gujarati => Some("gu"),
            Script::Oriya => Some("or"),
            Script::Tamil => Some("ta"),
            Script::Telugu => Some("te"),
            Script::Kannada => Some("kn"),
            Script::Malayalam => Some("ml"),
            Script::Sinhala => Some("si"),
            Script::Ethiopic => Some("am"),
            Script::Han => Some("zh"),
            Script::Kana => Some("ja"),
            Script::Hangul => Some("ko"),
            Script::Neutral | Script::Other => None,
        }
    }
}

/// Whether a character belongs to one of the language's scripts.
///
/// Returns `None` for neutral characters, which take their class from neighbours.
pub fn classify_char(ch: char, language: &str) -> Option<bool> {
    match Script::of(ch) {
        Script::Neutral => None,
        script => Some(Script::for_language(language).contains(&script)),
    }
}

/// Count letters per script, ignoring neutral characters
pub fn script_histogram(text: &str) -> HashMap<Script, usize> {
    let mut counts = HashMap::new();
    for ch in text.chars() {
        let script = Script::of(ch);
        if script != Script::Neutral {
            *counts.entry(script).or_insert(0) += 1;
        }
    }
    counts
}

/// Guess a language from the dominant script.
///
/// Kana anywhere in Han-heavy text means Japanese.
pub fn dominant_script_language(text: &str) -> Option<&'static str> {
    let counts = script_histogram(text);
    if counts.get(&Script::Kana).copied().unwrap_or(0) > 0 {
        return Some("ja");
    }
    counts
        .into_iter()
        .filter(|(script, _)| *script != Script::Other)
        .max_by_key(|(script, count)| (*count, std::cmp::Reverse(*script as u8)))
        .and_then(|(script, _)| script.default_language())
}

/// Brahmic scripts of the 0x0980..0x0DFF block run, 128 code points each
fn indic_script(u: u32) -> Option<Script> {
    let script = match u {
        0x0980..=0x09FF => Script::Bengali,
        0x0A00..=0x0A7F => Script::Gurmukhi,
        0x0A80..=0x0AFF => Script::Gujarati,
        0x0B00..=0x0B7F => Script::Oriya,
        0x0B80..=0x0BFF => Script::Tamil,
        0x0C00..=0x0C7F => Script::Telugu,
        0x0C80..=0x0CFF => Script::Kannada,
        0x0D00..=0x0D7F => Script::Malayalam,
        0x0D80..=0x0DFF => Script::Sinhala,
        _ => return None,
    };
    Some(script)
}

fn is_han(u: u32) -> bool {
    (0x3400..=0x4DBF).contains(&u)
        || (0x4E00..=0x9FFF).contains(&u)
        || (0xF900..=0xFAFF).contains(&u)
        || (0x20000..=0x2EBEF).contains(&u)
}

fn is_kana(u: u32) -> bool {
    (0x3040..=0x309F).contains(&u) || (0x30A0..=0x30FF).contains(&u) || (0x31F0..=0x31FF).contains(&u)
}

fn is_hangul(u: u32) -> bool {
    (0xAC00..=0xD7AF).contains(&u) || (0x1100..=0x11FF).contains(&u) || (0x3130..=0x318F).contains(&u)
}
