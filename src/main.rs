// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lexiflow::annotation::{ExtractedText, ProgressSnapshot};
use lexiflow::app_config::{self, Config, PipelineConfig};
use lexiflow::providers::{Ollama, Provider, ProviderPort};
use lexiflow::{AnnotationError, AnnotationPipeline, CancellationToken};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Pipeline tuning presets
#[derive(Debug, Clone, ValueEnum)]
enum CliPreset {
    Fast,
    Quality,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate a text or HTML file with phrase translations
    Annotate(AnnotateArgs),

    /// Generate shell completions for lexiflow
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct AnnotateArgs {
    /// Input text or HTML file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Language declared by the document, if known
    #[arg(long)]
    declared_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Translation calls in flight per segment
    #[arg(short, long)]
    batch_width: Option<usize>,

    /// Pipeline tuning preset, replacing the configured pipeline section
    #[arg(long, value_enum)]
    preset: Option<CliPreset>,

    /// Model name to use
    #[arg(short, long)]
    model: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Lexiflow - phrase-by-phrase annotation for language learners
#[derive(Parser, Debug)]
#[command(name = "lexiflow")]
#[command(version)]
#[command(about = "Annotate text with progressive phrase translations")]
#[command(long_about = "Lexiflow splits a document into short phrases and translates each one with a local LLM.
When the document is already in the target language, phrases are simplified instead.

EXAMPLES:
    lexiflow annotate article.txt -t fr            # Annotate into French
    lexiflow annotate page.html -t en -b 3         # Three calls in flight per segment
    lexiflow annotate notes.txt -t ja --preset fast
    lexiflow completions bash > lexiflow.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(std::io::stderr(), "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lexiflow", &mut std::io::stdout());
            Ok(())
        }
        Commands::Annotate(args) => run_annotate(args).await,
    }
}

/// Load the config file and apply command line overrides
fn load_config(options: &AnnotateArgs) -> Result<Config> {
    let config_path = Path::new(&options.config_path);
    if !config_path.exists() {
        warn!("Config file not found at '{}', creating default config.", options.config_path);
    }
    let mut config = Config::load_or_create(config_path)?;

    if let Some(preset) = &options.preset {
        config.pipeline = match preset {
            CliPreset::Fast => PipelineConfig::fast(),
            CliPreset::Quality => PipelineConfig::quality(),
        };
    }
    if let Some(target) = &options.target_language {
        config.target_language = target.clone();
    }
    if let Some(width) = options.batch_width {
        config.pipeline.batch_width = width;
    }
    if let Some(model) = &options.model {
        config.provider.model = model.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar
}

async fn run_annotate(options: AnnotateArgs) -> Result<()> {
    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let content = std::fs::read_to_string(&options.input)
        .with_context(|| format!("Failed to read input file: {:?}", options.input))?;
    let mut input = ExtractedText::new(content);
    input.declared_language = options.declared_language.clone();

    let provider = Ollama::from_url(
        &config.provider.endpoint,
        &config.provider.model,
        std::time::Duration::from_secs(config.provider.timeout_secs),
    );
    if let Err(e) = provider.test_connection().await {
        warn!("Ollama at {} is not reachable ({}); chunks will echo the source text", provider.base_url(), e);
    }
    info!("Lexiflow: Ollama - {}", provider.model());

    let port = ProviderPort::from_config(provider, &config.provider, &config.pipeline);
    let pipeline = AnnotationPipeline::new(config.pipeline.clone(), Arc::new(port));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling annotation");
                cancel.cancel();
            }
        });
    }

    let bar = progress_bar();
    let on_progress = |snapshot: &ProgressSnapshot| {
        if let Some(total) = snapshot.total_expected_chunks {
            bar.set_length(total as u64);
        }
        bar.set_position(snapshot.chunks.len() as u64);
        bar.set_message(snapshot.phase.to_string());
    };

    let result = pipeline
        .annotate(&input, &config.target_language, Some(&on_progress), &cancel)
        .await;
    bar.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(AnnotationError::Cancelled) => return Err(anyhow!("Annotation cancelled")),
        Err(e) => return Err(anyhow!(e)),
    };

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize annotation result")?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write output file: {:?}", path))?;
            info!("Success: {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
