//! Candidate retrieval against the vector index.
//!
//! [`VectorSearch`] is the collaborator boundary: a raw filtered similarity
//! query whose result order is opaque to this layer. [`Retriever`] owns the
//! orchestration around it: overfetch, source-item exclusion, truncation.

pub mod embedding;
pub mod error;
pub mod index;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use embedding::EmbeddingClient;
pub use error::RetrievalError;
pub use index::{QdrantProductIndex, build_document};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockVectorSearch;

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::Candidate;

/// Raw similarity query against the product index. Candidates come back in
/// the collaborator's relevance order and must not be re-sorted.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Returns up to `limit` candidates matching both halves of the
    /// category pair exactly.
    async fn query(
        &self,
        query_text: &str,
        supercategory: &str,
        category: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError>;
}

/// Administrative side of the index: the full catalog re-index.
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    /// Drops and rebuilds the collection from the catalog; returns the
    /// number of products indexed.
    async fn rebuild(&self) -> Result<usize, RetrievalError>;
}

/// Candidate retrieval with source-item exclusion.
pub struct Retriever {
    index: Arc<dyn VectorSearch>,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorSearch>) -> Self {
        Self { index }
    }

    /// Fetches up to `limit` candidates for the query under the category
    /// pair, excluding `exclude_sku`.
    ///
    /// One extra hit is requested to absorb the case where the source
    /// product itself is indexed and surfaces in its own results; after the
    /// exclusion the list is truncated back to `limit`. An empty result is
    /// a valid outcome, not an error.
    pub async fn search(
        &self,
        query_text: &str,
        supercategory: &str,
        category: &str,
        exclude_sku: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        let mut candidates = self
            .index
            .query(query_text, supercategory, category, limit + 1)
            .await?;

        candidates.retain(|c| c.sku != exclude_sku);
        candidates.truncate(limit);

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandidateMetadata;

    fn candidate(sku: &str) -> Candidate {
        Candidate {
            sku: sku.to_string(),
            score: 0.5,
            metadata: CandidateMetadata {
                supercategory: "Office Supplies".to_string(),
                category: "Paper".to_string(),
                class: String::new(),
                brand_name: String::new(),
                web_price: 0.0,
                uom: String::new(),
                uom_qty: 1,
                name: String::new(),
            },
            document: String::new(),
        }
    }

    #[tokio::test]
    async fn requests_one_extra_and_truncates_back() {
        let index = Arc::new(MockVectorSearch::with_results(vec![
            candidate("A"),
            candidate("B"),
            candidate("C"),
        ]));
        let retriever = Retriever::new(index.clone());

        let found = retriever
            .search("paper", "Office Supplies", "Paper", "", 2)
            .await
            .unwrap();

        assert_eq!(index.last_limit(), 3);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].sku, "A");
        assert_eq!(found[1].sku, "B");
        assert!(found.iter().all(|c| {
            c.metadata.supercategory == "Office Supplies" && c.metadata.category == "Paper"
        }));
    }

    #[tokio::test]
    async fn excluded_sku_is_removed_before_truncation() {
        let index = Arc::new(MockVectorSearch::with_results(vec![
            candidate("SOURCE"),
            candidate("A"),
            candidate("B"),
        ]));
        let retriever = Retriever::new(index);

        let found = retriever
            .search("paper", "Office Supplies", "Paper", "SOURCE", 2)
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.sku != "SOURCE"));
    }

    #[tokio::test]
    async fn collaborator_order_is_preserved() {
        // Scores deliberately unordered; the retriever must not re-sort.
        let mut first = candidate("A");
        first.score = 0.9;
        let mut second = candidate("B");
        second.score = 0.1;

        let index = Arc::new(MockVectorSearch::with_results(vec![first, second]));
        let retriever = Retriever::new(index);

        let found = retriever
            .search("paper", "Office Supplies", "Paper", "", 5)
            .await
            .unwrap();

        assert_eq!(found[0].sku, "A");
        assert_eq!(found[1].sku, "B");
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let index = Arc::new(MockVectorSearch::new());
        let retriever = Retriever::new(index);

        let found = retriever
            .search("widget", "Hardware", "Fasteners", "", 5)
            .await
            .unwrap();

        assert!(found.is_empty());
    }
}
