//! Canned [`RankingBackend`] for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{RankingBackend, RankingError};

/// Returns a fixed JSON body and counts calls.
#[derive(Default)]
pub struct MockRankingBackend {
    response: Mutex<String>,
    calls: AtomicUsize,
    fail: AtomicBool,
    last_prompt: Mutex<String>,
}

impl MockRankingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(response: String) -> Self {
        Self {
            response: Mutex::new(response),
            ..Self::default()
        }
    }

    pub fn set_response(&self, response: String) {
        *self.response.lock() = response;
    }

    /// Makes every subsequent call fail at the provider level.
    pub fn fail_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Number of `generate` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The prompt passed to the most recent call.
    pub fn last_prompt(&self) -> String {
        self.last_prompt.lock().clone()
    }
}

#[async_trait]
impl RankingBackend for MockRankingBackend {
    async fn generate(&self, prompt: &str) -> Result<String, RankingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = prompt.to_string();

        if self.fail.load(Ordering::SeqCst) {
            return Err(RankingError::Provider("injected failure".to_string()));
        }

        Ok(self.response.lock().clone())
    }
}
