/*!
 * Common test utilities for the better-translator test suite
 */

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;


/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// `count` paragraphs of exactly `length` characters each
pub fn paragraphs_of(count: usize, length: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let label = format!("P{} ", i);
            let filler = "x".repeat(length.saturating_sub(label.len()));
            format!("{}{}", label, filler)
        })
        .collect()
}

/// Join paragraphs with blank lines the way documents separate them
pub fn document_of(paragraphs: &[String]) -> String {
    paragraphs.join("\n\n")
}

/// Shared handle type for mock backends
pub fn shared<B: better_translator::Backend + 'static>(backend: B) -> Arc<dyn better_translator::Backend> {
    Arc::new(backend)
}
