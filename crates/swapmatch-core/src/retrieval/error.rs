use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Debug, Error)]
/// Errors returned by retrieval and indexing operations.
pub enum RetrievalError {
    /// Could not connect to the vector index endpoint.
    #[error("failed to connect to vector index at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Embedding request failed in transit.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// Embedding response could not be interpreted.
    #[error("embedding response malformed: {0}")]
    EmbeddingResponse(String),

    /// Similarity search failed.
    #[error("failed to search '{collection}': {message}")]
    SearchFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// Collection rebuild failed.
    #[error("failed to rebuild index '{collection}': {message}")]
    RebuildFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// The catalog feed for indexing failed.
    #[error("catalog read during indexing failed: {0}")]
    Catalog(#[from] CatalogError),
}
