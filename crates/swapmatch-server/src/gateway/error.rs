use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use swapmatch::catalog::CatalogError;
use swapmatch::quota::QuotaExceeded;
use swapmatch::retrieval::RetrievalError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Quota(#[from] QuotaExceeded),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("indexing failed: {0}")]
    Indexing(#[from] RetrievalError),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Quota(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Indexing(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
