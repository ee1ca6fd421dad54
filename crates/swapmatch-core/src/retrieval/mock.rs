//! In-memory [`VectorSearch`] / [`IndexAdmin`] for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{IndexAdmin, RetrievalError, VectorSearch};
use crate::domain::Candidate;

/// Canned search results with call counters.
#[derive(Default)]
pub struct MockVectorSearch {
    results: Mutex<Vec<Candidate>>,
    calls: AtomicUsize,
    last_limit: AtomicUsize,
    fail: AtomicBool,
}

impl MockVectorSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<Candidate>) -> Self {
        Self {
            results: Mutex::new(results),
            ..Self::default()
        }
    }

    pub fn set_results(&self, results: Vec<Candidate>) {
        *self.results.lock() = results;
    }

    /// Makes every subsequent query fail.
    pub fn fail_queries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Number of `query` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The `limit` passed to the most recent query.
    pub fn last_limit(&self) -> usize {
        self.last_limit.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorSearch for MockVectorSearch {
    async fn query(
        &self,
        _query_text: &str,
        supercategory: &str,
        category: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(RetrievalError::SearchFailed {
                collection: "mock".to_string(),
                message: "injected failure".to_string(),
            });
        }

        // Honor the conjunctive category filter the way the real index does.
        Ok(self
            .results
            .lock()
            .iter()
            .filter(|c| {
                c.metadata.supercategory == supercategory && c.metadata.category == category
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IndexAdmin for MockVectorSearch {
    async fn rebuild(&self) -> Result<usize, RetrievalError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RetrievalError::RebuildFailed {
                collection: "mock".to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(self.results.lock().len())
    }
}
