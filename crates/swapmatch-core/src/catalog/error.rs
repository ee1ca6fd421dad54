use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by catalog store operations.
pub enum CatalogError {
    /// Could not connect to the catalog database.
    #[error("failed to connect to catalog database: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A query failed or a row failed to decode.
    #[error("catalog query failed: {0}")]
    Query(#[from] sqlx::Error),
}
