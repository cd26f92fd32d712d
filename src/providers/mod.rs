/*!
 * Backend implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - OpenAI: hosted chat-completion API
 * - ERNIE: token-exchange HTTP API
 * - Mock: deterministic in-process backend for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{Config, TranslatorType};
use crate::errors::ProviderError;

/// Instruction shared by every backend
pub const TRANSLATION_INSTRUCTION: &str = "Translate the following English text to Simplified Chinese \
     while preserving the original formatting, including paragraphs and line breaks";

/// Common trait for all translation backends
///
/// A backend performs exactly one remote call per `translate` invocation and
/// never retries. Implementations are shared across concurrently running
/// chunk translations, so they must be `Send + Sync`.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Translate one piece of text
    async fn translate(&self, text: &str) -> Result<String, ProviderError>;

    /// Open any persistent connection state
    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Release persistent connection state
    async fn close(&self) {}
}

/// Build the backend selected by the configuration
pub fn build_backend(config: &Config) -> Arc<dyn Backend> {
    match config.translator_type {
        TranslatorType::OpenAI => Arc::new(openai::OpenAI::from_config(&config.openai)),
        TranslatorType::Ernie => Arc::new(ernie::Ernie::from_config(&config.ernie)),
    }
}

/// Convert CRLF line endings to LF
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Shorten text for log lines
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}

pub mod ernie;
pub mod mock;
pub mod openai;
