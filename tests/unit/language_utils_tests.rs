/*!
 * Tests for language utility functions
 */

use lexiflow::language_utils::{
    get_language_name, is_logographic_language, language_codes_match, normalize_language_tag, normalize_to_part2t,
};

/// Test normalization of language codes to ISO 639-2/T format
#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t(" JA ").unwrap(), "jpn");
}

/// Test canonical tag normalization used by the pipeline
#[test]
fn test_normalize_language_tag_withBcp47Tags_shouldReturnCanonicalCode() {
    assert_eq!(normalize_language_tag("en-GB").as_deref(), Some("en"));
    assert_eq!(normalize_language_tag("zh_Hans_CN").as_deref(), Some("zh"));
    assert_eq!(normalize_language_tag("es-419").as_deref(), Some("es"));
    assert_eq!(normalize_language_tag("jpn").as_deref(), Some("ja"));
    assert_eq!(normalize_language_tag("Chinese").as_deref(), Some("zh"));
    assert_eq!(normalize_language_tag(""), None);
    assert_eq!(normalize_language_tag("not a language"), None);
}

/// Test matching of different language code formats
#[test]
fn test_language_codes_match_withMatchingCodes_shouldReturnTrue() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("en-US", "en"));
    assert!(language_codes_match("fr", "fre"));
    assert!(language_codes_match("zh-TW", "chi"));
    assert!(language_codes_match("japanese", "ja"));
}

/// Test matching of non-matching language codes
#[test]
fn test_language_codes_match_withNonMatchingCodes_shouldReturnFalse() {
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("zh", "ja"));
    assert!(!language_codes_match("xyz", "xyz"));
}

#[test]
fn test_is_logographic_language_shouldAcceptTags() {
    assert!(is_logographic_language("zh-CN"));
    assert!(is_logographic_language("th"));
    assert!(!is_logographic_language("ko"));
    assert!(!is_logographic_language("en"));
}

/// Test getting language names from codes
#[test]
fn test_get_language_name_withValidCodes_shouldReturnCorrectName() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("fra").unwrap(), "French");
    assert_eq!(get_language_name("de-AT").unwrap(), "German");
    assert!(get_language_name("xyz").is_err());
}
