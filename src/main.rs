// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use better_translator::app_config::{Config, LogLevel};
use better_translator::server;
use better_translator::text::merge_translations;
use better_translator::translation::{TranslationCache, TranslationService};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP translation server
    Serve(ServeArgs),

    /// Translate a file or standard input
    Translate(TranslateArgs),

    /// Manage the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },

    /// Generate shell completions for better-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Remove every cached translation
    Clear,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input text file, or '-' for standard input
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Write the translation to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum chunk length in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Maximum number of backend calls in flight
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Neither read nor write the translation cache
    #[arg(long)]
    no_cache: bool,

    /// Append the original text below the translation
    #[arg(long)]
    bilingual: bool,

    /// Keep fenced code blocks out of the translation
    #[arg(long)]
    protect_code_blocks: bool,
}

/// Better Translator - chunked, concurrent, cached text translation
///
/// Splits long text into paragraph-preserving chunks, translates them
/// concurrently with OpenAI or ERNIE and caches the results.
#[derive(Parser, Debug)]
#[command(name = "better-translator")]
#[command(version)]
#[command(about = "Chunked, concurrent, cached text translation")]
#[command(long_about = "Better Translator splits long text into paragraph-preserving chunks and \
translates them concurrently with OpenAI or ERNIE.

EXAMPLES:
    better-translator serve                          # Start the HTTP server on 127.0.0.1:8000
    better-translator serve --port 9000              # Start the server on another port
    better-translator translate article.md           # Translate a file to standard output
    cat notes.txt | better-translator translate -    # Translate standard input
    better-translator translate --bilingual a.md -o a.zh.md
    better-translator cache clear                    # Empty the translation cache
    better-translator completions bash > bt.bash     # Generate bash completions

CONFIGURATION:
    Settings come from conf.json (optional), then .env and the environment
    (API_KEY, TRANSLATOR_TYPE, ERNIE_API_KEY, ERNIE_SECRET_KEY, CACHE_DIR, ...),
    then command line flags.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and emoji for a log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌"),
            Level::Warn => ("\x1B[1;33m", "🚧"),
            Level::Info => ("\x1B[1;32m", "✅"),
            Level::Debug => ("\x1B[1;36m", "🔍"),
            Level::Trace => ("\x1B[1;35m", "📋"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (colour, emoji) = Self::style_for_level(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "{}{} {} {}\x1B[0m",
            colour,
            now,
            emoji,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Register with the most verbose level; the effective level is set by
    // log::set_max_level once the configuration is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    dotenv::dotenv().ok();

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "better-translator", &mut std::io::stdout());
            Ok(())
        }
        Commands::Serve(args) => {
            let config = load_config(&cli.config, cli.log_level)?;
            run_serve(config, args).await
        }
        Commands::Translate(args) => {
            let config = load_config(&cli.config, cli.log_level)?;
            run_translate(config, args).await
        }
        Commands::Cache {
            action: CacheCommand::Clear,
        } => {
            let config = load_config(&cli.config, cli.log_level)?;
            run_cache_clear(config).await
        }
    }
}

/// Defaults, then the config file, then the environment, then CLI flags
fn load_config(path: &Path, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = Config::load(path)?;
    config
        .apply_process_env()
        .context("Invalid environment configuration")?;

    if let Some(level) = log_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

async fn run_serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    info!("Starting {}", config.app_name);
    let service = TranslationService::from_config(&config)?;
    server::serve(service, &config.server.host, config.server.port).await
}

async fn run_translate(mut config: Config, args: TranslateArgs) -> Result<()> {
    if let Some(chunk_size) = args.chunk_size {
        config.translation.chunk_size = chunk_size;
    }
    if let Some(max_concurrent) = args.max_concurrent {
        config.translation.max_concurrent = max_concurrent;
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
    if args.protect_code_blocks {
        config.translation.protect_code_blocks = true;
    }

    let source = read_input(args.input.as_deref()).await?;
    let service = TranslationService::from_config(&config)?;

    service
        .initialize()
        .await
        .context("Failed to initialize translation backend")?;
    let result = service.translate(&source).await;
    service.close().await;

    let outcome = result?;
    if outcome.is_partial() {
        warn!(
            "{} of {} chunks failed; their text is replaced by error markers",
            outcome.failed_chunks.len(),
            outcome.chunk_count
        );
    }

    let translated = if args.bilingual {
        merge_translations(&source, &outcome.text)
    } else {
        outcome.text
    };

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, translated)
                .await
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Translation written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout();
            writeln!(stdout, "{}", translated).context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

async fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        _ => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read standard input")?;
            Ok(buffer)
        }
    }
}

async fn run_cache_clear(config: Config) -> Result<()> {
    let cache = TranslationCache::open(&config.cache.dir)?;
    let removed = cache.clear().await?;
    info!("Removed {} cached translations from {}", removed, cache.path().display());
    Ok(())
}
