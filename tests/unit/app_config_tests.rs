/*!
 * Tests for application configuration functionality
 */

use lexiflow::app_config::{Config, LogLevel, PipelineConfig, ProviderConfig};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.target_language, "en");
    assert_eq!(config.pipeline.batch_width, 6);
    assert_eq!(config.pipeline.max_phrase_words, 4);
    assert_eq!(config.pipeline.max_logographic_run, 6);
    assert_eq!(config.provider.endpoint, "http://localhost:11434");
    assert_eq!(config.provider.max_sessions, 6);
    assert_eq!(config.provider.timeout_secs, 30);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // BCP-47 targets are accepted
    config.target_language = "pt-BR".to_string();
    assert!(config.validate().is_ok());

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "fr".to_string();

    config.pipeline.min_detection_confidence = 1.5;
    assert!(config.validate().is_err());
    config.pipeline.min_detection_confidence = 0.5;

    config.provider.model = "  ".to_string();
    assert!(config.validate().is_err());
    config.provider.model = "llama3.2:3b".to_string();

    config.provider.max_sessions = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_pipeline_config_builders_shouldOverrideFields() {
    let config = PipelineConfig::default()
        .with_batch_width(2)
        .with_max_phrase_words(3)
        .with_max_logographic_run(5)
        .with_min_detection_confidence(0.8);

    assert_eq!(config.batch_width, 2);
    assert_eq!(config.max_phrase_words, 3);
    assert_eq!(config.max_logographic_run, 5);
    assert!((config.min_detection_confidence - 0.8).abs() < f64::EPSILON);
    assert!(config.validate().is_ok());
}

/// Test saving and loading configuration from a file
#[test]
fn test_config_save_and_load_withTempFile_shouldRoundTrip() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "ja".to_string();
    config.pipeline = PipelineConfig::fast();
    config.provider = ProviderConfig {
        model: "qwen2.5:7b".to_string(),
        ..ProviderConfig::default()
    };
    config.log_level = LogLevel::Debug;

    config.save(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_load_or_create_withMissingFile_shouldWriteDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("missing.json");

    let config = Config::load_or_create(&path).unwrap();
    assert_eq!(config, Config::default());
    assert!(path.exists());

    // A second call reads the written file back
    assert_eq!(Config::load_or_create(&path).unwrap(), config);
}

#[test]
fn test_config_from_file_withInvalidJson_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_log_level_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
