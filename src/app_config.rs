use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Target language code (ISO or BCP-47)
    pub target_language: String,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Completion backend
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Tuning knobs for the annotation pipeline
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    // @field: Translation calls in flight per segment
    #[serde(default = "default_batch_width")]
    pub batch_width: usize,

    // @field: Word limit per phrase in spaced languages
    #[serde(default = "default_max_phrase_words")]
    pub max_phrase_words: usize,

    // @field: Character limit per piece in logographic languages
    #[serde(default = "default_max_logographic_run")]
    pub max_logographic_run: usize,

    // @field: Statistical detections below this are rejected
    #[serde(default = "default_min_detection_confidence")]
    pub min_detection_confidence: f64,

    // @field: Context kept on each side of a simplified span
    #[serde(default = "default_simplify_context_chars")]
    pub simplify_context_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_width: default_batch_width(),
            max_phrase_words: default_max_phrase_words(),
            max_logographic_run: default_max_logographic_run(),
            min_detection_confidence: default_min_detection_confidence(),
            simplify_context_chars: default_simplify_context_chars(),
        }
    }
}

impl PipelineConfig {
    /// Wider batches and shorter phrases for quick first results
    pub fn fast() -> Self {
        Self {
            batch_width: 10,
            max_phrase_words: 3,
            max_logographic_run: 4,
            min_detection_confidence: 0.3,
            simplify_context_chars: 60,
        }
    }

    /// Narrower batches and longer phrases for better contextual renderings
    pub fn quality() -> Self {
        Self {
            batch_width: 4,
            max_phrase_words: 5,
            max_logographic_run: 8,
            min_detection_confidence: 0.7,
            simplify_context_chars: 240,
        }
    }

    pub fn with_batch_width(mut self, width: usize) -> Self {
        self.batch_width = width;
        self
    }

    pub fn with_max_phrase_words(mut self, words: usize) -> Self {
        self.max_phrase_words = words;
        self
    }

    pub fn with_max_logographic_run(mut self, chars: usize) -> Self {
        self.max_logographic_run = chars;
        self
    }

    pub fn with_min_detection_confidence(mut self, confidence: f64) -> Self {
        self.min_detection_confidence = confidence;
        self
    }

    /// Check ranges of every knob
    pub fn validate(&self) -> Result<()> {
        if self.batch_width == 0 {
            return Err(anyhow!("Pipeline batch width must be greater than zero"));
        }
        if self.max_phrase_words == 0 || self.max_logographic_run == 0 {
            return Err(anyhow!("Phrase limits must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(anyhow!(
                "Detection confidence must be between 0 and 1, got {}",
                self.min_detection_confidence
            ));
        }
        Ok(())
    }
}

/// Completion backend configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Service URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    // @field: Sessions leased at once
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    // @field: Idle sessions older than this are evicted
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_idle_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl ProviderConfig {
    /// Check the endpoint and limits
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", self.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("Provider endpoint must use http or https: {}", self.endpoint));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("Provider model name is required"));
        }
        if self.max_sessions == 0 {
            return Err(anyhow!("Provider max_sessions must be greater than zero"));
        }
        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_batch_width() -> usize {
    6
}

fn default_max_phrase_words() -> usize {
    4
}

fn default_max_logographic_run() -> usize {
    6
}

fn default_min_detection_confidence() -> f64 {
    0.5
}

fn default_simplify_context_chars() -> usize {
    120
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_max_sessions() -> usize {
    6
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.2
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Load `path`, or write and return the default configuration if it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let _target_name = crate::language_utils::get_language_name(&self.target_language)
            .with_context(|| format!("Unsupported target language: {}", self.target_language))?;
        self.pipeline.validate()?;
        self.provider.validate()?;
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: "en".to_string(),
            pipeline: PipelineConfig::default(),
            provider: ProviderConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
