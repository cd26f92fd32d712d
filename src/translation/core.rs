/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService`, which turns arbitrary-length
 * text into a translation:
 *
 * - short text (at most `chunk_size` characters) goes to the backend in a
 *   single call, and errors propagate to the caller
 * - longer text is split into paragraphs, repacked into chunks and dispatched
 *   concurrently; failed chunks are replaced by an inline error marker
 *
 * Paragraph breaks travel through the backend as placeholders so that a
 * backend that collapses whitespace cannot merge paragraphs.
 */

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;

use super::cache::TranslationCache;
use super::dispatch::{ChunkDispatcher, ChunkOutcome};
use crate::app_config::{Config, TranslationSettings, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENT};
use crate::errors::{AppError, ProviderError, TranslationError};
use crate::providers::{build_backend, Backend};
use crate::text::{
    char_len, extract_code_blocks, merge_chunks, restore_code_blocks, split_paragraphs, PlaceholderCodec,
    PARAGRAPH_SEPARATOR,
};

/// Text substituted for a chunk whose translation failed
pub fn error_marker(message: &str) -> String {
    format!("[Translation Error: {}]", message)
}

/// Translation options for customizing the translation process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationOptions {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Maximum number of backend calls in flight per request
    pub max_concurrent: usize,

    /// Keep fenced code blocks away from the backend
    pub protect_code_blocks: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            protect_code_blocks: false,
        }
    }
}

impl From<&TranslationSettings> for TranslationOptions {
    fn from(settings: &TranslationSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            max_concurrent: settings.max_concurrent,
            protect_code_blocks: settings.protect_code_blocks,
        }
    }
}

impl TranslationOptions {
    /// Check that the sizes can be honoured
    pub fn validate(&self) -> Result<(), TranslationError> {
        validate_sizes(self.chunk_size, self.max_concurrent)
    }
}

fn validate_sizes(chunk_size: usize, max_concurrent: usize) -> Result<(), TranslationError> {
    if chunk_size == 0 {
        return Err(TranslationError::InvalidOptions(
            "chunk_size must be at least 1".to_string(),
        ));
    }
    if max_concurrent == 0 {
        return Err(TranslationError::InvalidOptions(
            "max_concurrent must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Result of translating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// The translated text, including error markers for failed chunks
    pub text: String,

    /// Number of backend calls the request needed; zero for cache hits
    pub chunk_count: usize,

    /// Indices of chunks whose translation failed
    pub failed_chunks: Vec<usize>,

    /// Whether the text came from the cache
    pub cached: bool,
}

impl TranslationOutcome {
    fn from_cache(text: String) -> Self {
        Self {
            text,
            chunk_count: 0,
            failed_chunks: Vec::new(),
            cached: true,
        }
    }

    /// Whether at least one chunk failed
    pub fn is_partial(&self) -> bool {
        !self.failed_chunks.is_empty()
    }
}

/// Main translation service
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Backend shared by every chunk and request
    backend: Arc<dyn Backend>,

    /// Translation options
    pub options: TranslationOptions,

    /// Translation cache, absent when caching is disabled
    cache: Option<TranslationCache>,
}

impl TranslationService {
    /// Create a service without a cache
    pub fn new(backend: Arc<dyn Backend>, options: TranslationOptions) -> Self {
        Self {
            backend,
            options,
            cache: None,
        }
    }

    /// Attach a translation cache
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the service described by the configuration
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;

        let options = TranslationOptions::from(&config.translation);
        options.validate()?;

        let backend = build_backend(config);
        info!(
            "Using {} backend (chunk size {}, max {} concurrent)",
            config.translator_type.display_name(),
            options.chunk_size,
            options.max_concurrent
        );

        let service = Self::new(backend, options);
        if !config.cache.enabled {
            info!("Translation cache disabled");
            return Ok(service);
        }

        let cache = TranslationCache::open(&config.cache.dir)
            .map_err(|e| AppError::Cache(format!("{:#}", e)))?;
        Ok(service.with_cache(cache))
    }

    /// The backend in use
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The translation cache, if enabled
    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_ref()
    }

    /// Open backend resources
    pub async fn initialize(&self) -> Result<(), ProviderError> {
        self.backend.initialize().await
    }

    /// Release backend resources
    pub async fn close(&self) {
        self.backend.close().await;
    }

    /// Translate a single piece of text with one backend call
    pub async fn translate_text(&self, text: &str) -> Result<String, TranslationError> {
        match self.backend.translate(text).await {
            Ok(translated) => Ok(translated),
            Err(e) => {
                error!("Translation failed ({}): {}", self.backend.name(), e);
                Err(e.into())
            }
        }
    }

    /// Translate a request, consulting the cache first
    ///
    /// Cache failures never fail the translation; they are logged and the
    /// request proceeds as a miss. Results with failed chunks are not stored.
    pub async fn translate(&self, text: &str) -> Result<TranslationOutcome, TranslationError> {
        if let Some(cache) = &self.cache {
            match cache.get(text).await {
                Ok(Some(translated)) => {
                    info!("Cache hit ({} chars)", char_len(text));
                    return Ok(TranslationOutcome::from_cache(translated));
                }
                Ok(None) => {}
                Err(e) => warn!("Cache lookup failed: {:#}", e),
            }
        }

        let outcome = self.translate_uncached(text).await?;

        if outcome.is_partial() {
            warn!(
                "{} of {} chunks failed, result not cached",
                outcome.failed_chunks.len(),
                outcome.chunk_count
            );
        } else if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(text, &outcome.text).await {
                warn!("Failed to cache translation: {:#}", e);
            }
        }

        Ok(outcome)
    }

    /// Run the pipeline with the configured options, bypassing the cache
    pub async fn translate_uncached(&self, text: &str) -> Result<TranslationOutcome, TranslationError> {
        let TranslationOptions {
            chunk_size,
            max_concurrent,
            protect_code_blocks,
        } = self.options;

        if !protect_code_blocks {
            return self.translate_chunks_with(text, chunk_size, max_concurrent).await;
        }

        let (guarded, blocks) = extract_code_blocks(text);
        if !blocks.is_empty() {
            debug!("Protecting {} code blocks", blocks.len());
        }

        let mut outcome = self
            .translate_chunks_with(&guarded, chunk_size, max_concurrent)
            .await?;
        outcome.text = restore_code_blocks(&outcome.text, &blocks);
        Ok(outcome)
    }

    /// Translate text of any length, returning the joined translation
    pub async fn translate_chunks(
        &self,
        text: &str,
        chunk_size: usize,
        max_concurrent: usize,
    ) -> Result<String, TranslationError> {
        self.translate_chunks_with(text, chunk_size, max_concurrent)
            .await
            .map(|outcome| outcome.text)
    }

    /// Translate text of any length, reporting which chunks failed
    pub async fn translate_chunks_with(
        &self,
        text: &str,
        chunk_size: usize,
        max_concurrent: usize,
    ) -> Result<TranslationOutcome, TranslationError> {
        validate_sizes(chunk_size, max_concurrent)?;

        if PlaceholderCodec::contains_marker(text) {
            warn!("Input already contains the paragraph break placeholder; it will come back as a blank line");
        }

        let start_time = Instant::now();
        let length = char_len(text);

        if length <= chunk_size {
            debug!("Translating {} chars in a single call", length);
            let translated = self.translate_text(&PlaceholderCodec::encode(text)).await?;
            info!("Translated {} chars in {:?}", length, start_time.elapsed());

            return Ok(TranslationOutcome {
                text: PlaceholderCodec::decode(&translated),
                chunk_count: 1,
                failed_chunks: Vec::new(),
                cached: false,
            });
        }

        let paragraphs = split_paragraphs(text);
        let chunks: Vec<String> = merge_chunks(&paragraphs, chunk_size)
            .iter()
            .map(|chunk| PlaceholderCodec::encode(chunk))
            .collect();
        let chunk_count = chunks.len();

        info!(
            "Translating {} chars: {} paragraphs in {} chunks",
            length,
            paragraphs.len(),
            chunk_count
        );

        let dispatcher = ChunkDispatcher::new(self.backend.clone(), max_concurrent);
        let outcomes = dispatcher.dispatch(chunks).await;
        let (text, failed_chunks) = join_outcomes(outcomes);

        info!(
            "Translated {} chunks in {:?} ({} failed)",
            chunk_count,
            start_time.elapsed(),
            failed_chunks.len()
        );

        Ok(TranslationOutcome {
            text,
            chunk_count,
            failed_chunks,
            cached: false,
        })
    }
}

/// Decode successes, mark failures and join in order
fn join_outcomes(outcomes: Vec<ChunkOutcome>) -> (String, Vec<usize>) {
    let mut failed = Vec::new();

    let pieces: Vec<String> = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Ok(translated) => PlaceholderCodec::decode(&translated),
            Err(failure) => {
                failed.push(failure.index);
                error_marker(&failure.message)
            }
        })
        .collect();

    (pieces.join(PARAGRAPH_SEPARATOR), failed)
}
