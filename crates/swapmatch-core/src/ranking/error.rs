use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the ranking orchestrator.
pub enum RankingError {
    /// The ranking provider call failed in transit.
    #[error("ranking call failed: {0}")]
    Provider(String),

    /// The provider's response violated the output contract. Malformed
    /// responses fail the request; fields are never silently coerced.
    #[error("ranking response malformed: {0}")]
    MalformedResponse(String),
}
