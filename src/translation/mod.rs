/*!
 * Translation service for arbitrary-length text.
 *
 * This module contains the request pipeline that sits on top of a backend.
 * It is split into several submodules:
 *
 * - `core`: the translation service, short path and chunked path
 * - `dispatch`: concurrent chunk dispatch with a bounded number of calls in flight
 * - `cache`: persistent translation cache
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, TranslationCache};
pub use self::core::{error_marker, TranslationOptions, TranslationOutcome, TranslationService};
pub use self::dispatch::{ChunkDispatcher, ChunkFailure, ChunkOutcome};

// Submodules
pub mod cache;
pub mod core;
pub mod dispatch;
