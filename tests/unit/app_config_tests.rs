/*!
 * Tests for application configuration functionality
 */

use better_translator::app_config::{Config, LogLevel, TranslatorType, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENT};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::common::create_temp_dir;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.translator_type, TranslatorType::OpenAI);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.dir, PathBuf::from("./cache"));
    assert_eq!(config.openai.model, "gpt-4o");
    assert_eq!(config.openai.endpoint, "https://api.openai.com/v1");
    assert_eq!(config.translation.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.translation.max_concurrent, DEFAULT_MAX_CONCURRENT);
    assert_eq!(config.translation.max_concurrent, 10);
    assert!(!config.translation.protect_code_blocks);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
}

/// Test environment overrides
#[test]
fn test_apply_env_withAllVariables_shouldOverrideDefaults() {
    let mut config = Config::default();
    config
        .apply_env(lookup_from(&[
            ("APP_NAME", "Gateway"),
            ("LOG_LEVEL", "WARNING"),
            ("CACHE_ENABLED", "false"),
            ("CACHE_DIR", "/tmp/translations"),
            ("API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_API_URL", "http://localhost:9000/v1"),
            ("ERNIE_API_KEY", "ek"),
            ("ERNIE_SECRET_KEY", "es"),
            ("ERNIE_API_URL", "http://localhost:9001/chat"),
            ("TRANSLATOR_TYPE", "ERNIE"),
            ("CHUNK_SIZE", "500"),
            ("MAX_CONCURRENT", "3"),
            ("HOST", "0.0.0.0"),
            ("PORT", "9100"),
        ]))
        .unwrap();

    assert_eq!(config.app_name, "Gateway");
    assert_eq!(config.log_level, LogLevel::Warn);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.dir, PathBuf::from("/tmp/translations"));
    assert_eq!(config.openai.api_key, "sk-test");
    assert_eq!(config.openai.model, "gpt-4o-mini");
    assert_eq!(config.openai.endpoint, "http://localhost:9000/v1");
    assert_eq!(config.ernie.api_key, "ek");
    assert_eq!(config.ernie.secret_key, "es");
    assert_eq!(config.ernie.api_url, "http://localhost:9001/chat");
    assert_eq!(config.translator_type, TranslatorType::Ernie);
    assert_eq!(config.translation.chunk_size, 500);
    assert_eq!(config.translation.max_concurrent, 3);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9100);
}

/// Test an unsupported translator type is rejected
#[test]
fn test_apply_env_withUnsupportedTranslator_shouldFail() {
    let mut config = Config::default();
    let error = config
        .apply_env(lookup_from(&[("TRANSLATOR_TYPE", "deepl")]))
        .unwrap_err();
    assert!(error.to_string().contains("Unsupported translator type"));
}

/// Test malformed numbers and booleans are rejected
#[test]
fn test_apply_env_withMalformedValues_shouldFail() {
    let mut config = Config::default();
    assert!(config.apply_env(lookup_from(&[("CHUNK_SIZE", "big")])).is_err());
    assert!(config.apply_env(lookup_from(&[("CACHE_ENABLED", "maybe")])).is_err());
    assert!(config.apply_env(lookup_from(&[("PORT", "70000")])).is_err());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    // OpenAI needs an API key
    assert!(config.validate().is_err());
    config.openai.api_key = "sk-1234567890".to_string();
    assert!(config.validate().is_ok());

    // Sizes must be positive
    config.translation.chunk_size = 0;
    assert!(config.validate().is_err());
    config.translation.chunk_size = 1000;
    config.translation.max_concurrent = 0;
    assert!(config.validate().is_err());
    config.translation.max_concurrent = 10;

    // ERNIE needs both credentials and parseable URLs
    config.translator_type = TranslatorType::Ernie;
    assert!(config.validate().is_err());
    config.ernie.api_key = "ek".to_string();
    config.ernie.secret_key = "es".to_string();
    assert!(config.validate().is_ok());
    config.ernie.api_url = "not a url".to_string();
    assert!(config.validate().is_err());
}

/// Test loading from a JSON file with partial content
#[test]
fn test_load_withPartialFile_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{"translator_type": "ernie", "translation": {"chunk_size": 250}}"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.translator_type, TranslatorType::Ernie);
    assert_eq!(config.translation.chunk_size, 250);
    assert_eq!(config.translation.max_concurrent, DEFAULT_MAX_CONCURRENT);
    assert_eq!(config.openai.model, "gpt-4o");
}

/// Test a missing file falls back to defaults and a broken one fails
#[test]
fn test_load_withMissingOrBrokenFile_shouldBehave() {
    let dir = create_temp_dir().unwrap();

    let config = Config::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config.translation.chunk_size, DEFAULT_CHUNK_SIZE);

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let error = Config::load(&broken).unwrap_err();
    assert!(format!("{:#}", error).contains("Failed to parse config file"));
}

/// Test translator type parsing
#[test]
fn test_translator_type_fromStr_shouldBeCaseInsensitive() {
    assert_eq!("OpenAI".parse::<TranslatorType>().unwrap(), TranslatorType::OpenAI);
    assert_eq!(" ernie ".parse::<TranslatorType>().unwrap(), TranslatorType::Ernie);
    assert!("".parse::<TranslatorType>().is_err());
    assert_eq!(TranslatorType::Ernie.to_string(), "ernie");
}

/// Test log level parsing accepts common aliases
#[test]
fn test_log_level_fromStr_withAliases_shouldMap() {
    assert_eq!("critical".parse::<LogLevel>().unwrap(), LogLevel::Error);
    assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
    assert!("loud".parse::<LogLevel>().is_err());
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
