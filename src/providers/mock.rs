/*!
 * Mock backend for testing.
 *
 * This module provides a mock backend that simulates different behaviors:
 * - `MockBackend::working()` - Always succeeds with translated text
 * - `MockBackend::failing()` - Always fails with an error
 * - `MockBackend::failing_on(needle)` - Fails for texts containing `needle`
 * - `MockBackend::intermittent(n)` - Fails every nth call
 * - `MockBackend::collapsing()` - Succeeds but collapses blank lines like a
 *   whitespace-lossy backend would
 *
 * Clones share their counters, so a test can keep one handle while the
 * service owns another.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::Backend;
use crate::errors::ProviderError;

/// Prefix the mock puts in front of every "translation"
pub const MOCK_PREFIX: &str = "[ZH] ";

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Always fails with an error
    Failing,
    /// Fails for texts containing the needle, succeeds otherwise
    FailWhenContains(String),
    /// Fails every Nth call
    Intermittent { fail_every: usize },
    /// Succeeds but squashes every whitespace run that contains a newline
    CollapseWhitespace,
}

/// Mock backend for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockBackend {
    behavior: MockBehavior,
    /// Artificial latency applied to every call
    delay: Duration,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    /// Every text received, in arrival order
    received: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock backend failing on texts that contain `needle`
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailWhenContains(needle.into()))
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a mock backend that mangles blank lines
    pub fn collapsing() -> Self {
        Self::new(MockBehavior::CollapseWhitespace)
    }

    /// Delay every call by `delay_ms` milliseconds
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Duration::from_millis(delay_ms);
        self
    }

    /// The mock's translation of a text
    pub fn expected_translation(text: &str) -> String {
        format!("{}{}", MOCK_PREFIX, text)
    }

    /// Total number of calls made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Texts received so far
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    fn simulated_error(message: String) -> ProviderError {
        ProviderError::ApiError {
            status_code: 500,
            message,
        }
    }
}

/// Replace each whitespace run containing a newline with a single space
fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut run = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            if run.contains('\n') {
                collapsed.push(' ');
            } else {
                collapsed.push_str(&run);
            }
            run.clear();
        }
        collapsed.push(c);
    }

    collapsed
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        self.received.lock().push(text.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match &self.behavior {
            MockBehavior::Working => Ok(Self::expected_translation(text)),
            MockBehavior::Failing => Err(Self::simulated_error("Simulated backend failure".to_string())),
            MockBehavior::FailWhenContains(needle) => {
                if text.contains(needle.as_str()) {
                    Err(Self::simulated_error(format!("Simulated failure for '{}'", needle)))
                } else {
                    Ok(Self::expected_translation(text))
                }
            }
            MockBehavior::Intermittent { fail_every } => {
                if call % fail_every == 0 {
                    Err(Self::simulated_error(format!(
                        "Simulated intermittent failure (request #{})",
                        call
                    )))
                } else {
                    Ok(Self::expected_translation(text))
                }
            }
            MockBehavior::CollapseWhitespace => Ok(Self::expected_translation(&collapse_whitespace(text))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
