use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::HeaderValue,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use futures_util::StreamExt;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, instrument};

use swapmatch::domain::{CategoryPair, SourceItem};

use crate::gateway::error::GatewayError;
use crate::gateway::state::GatewayState;

/// Response header carrying the client's remaining daily allowance.
pub const QUOTA_REMAINING_HEADER: &str = "x-quota-remaining";

/// `POST /substitute`: runs the pipeline and streams its progress.
///
/// Quota and validation failures are plain HTTP rejections; once the event
/// stream has started, every failure arrives as a single terminal `error`
/// event instead. The pipeline task runs detached: if the client
/// disconnects, the drain side drops and the pipeline stops at its next
/// event (an in-flight collaborator call still completes, its result is
/// discarded).
#[instrument(skip(state, item), fields(name = %item.name))]
pub async fn substitute_handler(
    State(state): State<GatewayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(item): Json<SourceItem>,
) -> Result<Response, GatewayError> {
    let client = peer.ip().to_string();
    let remaining = state.quota.check(&client, Utc::now().date_naive())?;

    if !item.has_category_pair() {
        return Err(GatewayError::InvalidRequest(
            "Both supercategory and category are required.".to_string(),
        ));
    }

    info!(client = %client, remaining, "substitution request admitted");

    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.run(item, tx).await;
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| Event::default().json_data(&event));

    let mut response = Sse::new(stream).keep_alive(KeepAlive::default()).into_response();
    response
        .headers_mut()
        .insert(QUOTA_REMAINING_HEADER, HeaderValue::from(remaining));

    Ok(response)
}

/// `GET /categories`: distinct (supercategory, category) pairs.
pub async fn categories_handler(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<CategoryPair>>, GatewayError> {
    Ok(Json(state.catalog.categories().await?))
}

#[derive(serde::Serialize)]
pub struct ReindexResponse {
    pub message: String,
    pub indexed: usize,
}

/// `POST /index`: full catalog re-index into the vector collaborator.
/// Blocks until completion so the caller observes success or failure.
pub async fn reindex_handler(
    State(state): State<GatewayState>,
) -> Result<Json<ReindexResponse>, GatewayError> {
    let indexed = state.index.rebuild().await?;
    info!(indexed, "catalog re-index complete");

    Ok(Json(ReindexResponse {
        message: "Indexing complete.".to_string(),
        indexed,
    }))
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /health`: liveness probe.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
