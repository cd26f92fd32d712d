/*!
 * # Better Translator
 *
 * A text-translation gateway: arbitrary-length text is split into
 * translation-safe chunks, dispatched concurrently to a translation backend,
 * reassembled in order and cached.
 *
 * ## Features
 *
 * - Paragraph-preserving chunking with a character budget per chunk
 * - Bounded concurrent dispatch with per-chunk failure containment
 * - Backends:
 *   - OpenAI chat completions
 *   - Baidu ERNIE (OAuth token exchange)
 * - SQLite translation cache keyed by content hash
 * - HTTP front end (`POST /translate`)
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `text`: Splitting, chunking and placeholder handling
 * - `translation`: The translation pipeline:
 *   - `translation::core`: Translation service, short and chunked paths
 *   - `translation::dispatch`: Concurrent chunk dispatch
 *   - `translation::cache`: Persistent translation cache
 * - `providers`: Backend clients:
 *   - `providers::openai`: OpenAI API client
 *   - `providers::ernie`: ERNIE API client
 *   - `providers::mock`: In-process backend for tests and benchmarks
 * - `server`: HTTP routes
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod providers;
pub mod server;
pub mod text;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, TranslatorType};
pub use errors::{AppError, ProviderError, TranslationError};
pub use providers::Backend;
pub use translation::{TranslationCache, TranslationOptions, TranslationOutcome, TranslationService};
