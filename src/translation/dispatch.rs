/*!
 * Concurrent chunk dispatch.
 *
 * Every chunk future is created up front and polled from one task; a
 * semaphore bounds the number of backend calls in flight. A failing chunk
 * never aborts its siblings: every chunk yields its own outcome, and outcomes
 * come back in input order.
 */

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::providers::Backend;

/// Per-chunk failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Position of the chunk in the input
    pub index: usize,
    /// Backend error message
    pub message: String,
}

/// Translated chunk or the reason it failed
pub type ChunkOutcome = Result<String, ChunkFailure>;

/// Sends chunks to a backend with bounded concurrency
#[derive(Debug, Clone)]
pub struct ChunkDispatcher {
    backend: Arc<dyn Backend>,
    max_concurrent: usize,
}

impl ChunkDispatcher {
    /// Create a dispatcher; a limit of zero is treated as one
    pub fn new(backend: Arc<dyn Backend>, max_concurrent: usize) -> Self {
        Self {
            backend,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Effective concurrency limit
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Translate every chunk, returning one outcome per chunk in input order
    pub async fn dispatch(&self, chunks: Vec<String>) -> Vec<ChunkOutcome> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let total = chunks.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        debug!(
            "Dispatching {} chunks to {} (max {} in flight)",
            total,
            self.backend.name(),
            self.max_concurrent
        );

        let mut results = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let backend = self.backend.clone();
                let semaphore = semaphore.clone();

                async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return (
                                index,
                                Err(ChunkFailure {
                                    index,
                                    message: format!("Dispatcher shut down: {}", e),
                                }),
                            );
                        }
                    };

                    let start_time = Instant::now();
                    let result = backend.translate(&chunk).await;

                    match result {
                        Ok(translated) => {
                            debug!("Chunk {}/{} translated in {:?}", index + 1, total, start_time.elapsed());
                            (index, Ok(translated))
                        }
                        Err(e) => {
                            error!("Chunk {}/{} failed: {}", index + 1, total, e);
                            (
                                index,
                                Err(ChunkFailure {
                                    index,
                                    message: e.to_string(),
                                }),
                            )
                        }
                    }
                }
            })
            .collect::<FuturesUnordered<_>>()
            .collect::<Vec<_>>()
            .await;

        // Completion order is arbitrary
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
