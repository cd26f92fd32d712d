/*!
 * Application configuration: defaults, an optional JSON file, and
 * environment overrides.
 */

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Display name of the service
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Which backend translates the text
    #[serde(default)]
    pub translator_type: TranslatorType,

    /// Translation cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// OpenAI backend settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// ERNIE backend settings
    #[serde(default)]
    pub ernie: ErnieConfig,

    /// Chunking and dispatch settings
    #[serde(default)]
    pub translation: TranslationSettings,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorType {
    // @backend: OpenAI chat completions
    #[default]
    OpenAI,
    // @backend: Baidu ERNIE with OAuth token exchange
    Ernie,
}

impl TranslatorType {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Ernie => "ERNIE",
        }
    }
}

impl std::fmt::Display for TranslatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Ernie => write!(f, "ernie"),
        }
    }
}

impl std::str::FromStr for TranslatorType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ernie" => Ok(Self::Ernie),
            _ => Err(anyhow!("Unsupported translator type: {}", s)),
        }
    }
}

/// Translation cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether the cache is consulted at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding the cache database
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
        }
    }
}

/// OpenAI service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    /// API key for the service
    #[serde(default)]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Service endpoint URL (for proxies or self-hosted gateways)
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            endpoint: default_openai_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// ERNIE service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErnieConfig {
    /// Client id used for the token exchange
    #[serde(default)]
    pub api_key: String,

    /// Client secret used for the token exchange
    #[serde(default)]
    pub secret_key: String,

    /// Chat completion endpoint
    #[serde(default = "default_ernie_api_url")]
    pub api_url: String,

    /// OAuth token endpoint
    #[serde(default = "default_ernie_token_url")]
    pub token_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ErnieConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            api_url: default_ernie_api_url(),
            token_url: default_ernie_token_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Chunking and dispatch settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationSettings {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum number of backend calls in flight per request
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Keep fenced code blocks away from the backend
    #[serde(default)]
    pub protect_code_blocks: bool,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_concurrent: default_max_concurrent(),
            protect_code_blocks: false,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
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
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" | "critical" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

fn default_app_name() -> String {
    "Better Translator".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ernie_api_url() -> String {
    "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions".to_string()
}

fn default_ernie_token_url() -> String {
    "https://aip.baidubce.com/oauth/2.0/token".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Parse a boolean the way environment files usually spell it
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("Invalid boolean for {}: {}", key, value)),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid number for {}: {}", key, value))
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Override settings from the process environment
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Override settings from environment variables supplied by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("APP_NAME") {
            self.app_name = value;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.log_level = value.parse()?;
        }
        if let Some(value) = lookup("CACHE_ENABLED") {
            self.cache.enabled = parse_bool("CACHE_ENABLED", &value)?;
        }
        if let Some(value) = lookup("CACHE_DIR") {
            self.cache.dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("TRANSLATOR_TYPE") {
            self.translator_type = value.parse()?;
        }
        if let Some(value) = lookup("API_KEY") {
            self.openai.api_key = value;
        }
        if let Some(value) = lookup("OPENAI_MODEL") {
            self.openai.model = value;
        }
        if let Some(value) = lookup("OPENAI_API_URL") {
            self.openai.endpoint = value;
        }
        if let Some(value) = lookup("ERNIE_API_KEY") {
            self.ernie.api_key = value;
        }
        if let Some(value) = lookup("ERNIE_SECRET_KEY") {
            self.ernie.secret_key = value;
        }
        if let Some(value) = lookup("ERNIE_API_URL") {
            self.ernie.api_url = value;
        }
        if let Some(value) = lookup("CHUNK_SIZE") {
            self.translation.chunk_size = parse_number("CHUNK_SIZE", &value)?;
        }
        if let Some(value) = lookup("MAX_CONCURRENT") {
            self.translation.max_concurrent = parse_number("MAX_CONCURRENT", &value)?;
        }
        if let Some(value) = lookup("HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_number("PORT", &value)?;
        }

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.translation.chunk_size == 0 {
            return Err(anyhow!("chunk_size must be at least 1"));
        }
        if self.translation.max_concurrent == 0 {
            return Err(anyhow!("max_concurrent must be at least 1"));
        }

        match self.translator_type {
            TranslatorType::OpenAI => {
                if self.openai.api_key.is_empty() {
                    return Err(anyhow!("API_KEY is required for the OpenAI translator"));
                }
            }
            TranslatorType::Ernie => {
                if self.ernie.api_key.is_empty() || self.ernie.secret_key.is_empty() {
                    return Err(anyhow!(
                        "ERNIE_API_KEY and ERNIE_SECRET_KEY are required for the ERNIE translator"
                    ));
                }
                Url::parse(&self.ernie.api_url)
                    .with_context(|| format!("Invalid ERNIE_API_URL: {}", self.ernie.api_url))?;
                Url::parse(&self.ernie.token_url)
                    .with_context(|| format!("Invalid ERNIE token URL: {}", self.ernie.token_url))?;
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            app_name: default_app_name(),
            log_level: LogLevel::default(),
            translator_type: TranslatorType::default(),
            cache: CacheConfig::default(),
            openai: OpenAIConfig::default(),
            ernie: ErnieConfig::default(),
            translation: TranslationSettings::default(),
            server: ServerConfig::default(),
        }
    }
}
