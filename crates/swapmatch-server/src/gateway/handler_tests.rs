//! Router-level tests for the gateway: pre-stream rejections, the SSE event
//! stream, and the delegated categories/index/health routes.

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use swapmatch::catalog::MockCatalog;
use swapmatch::domain::{Candidate, CandidateMetadata, CategoryPair};
use swapmatch::pipeline::{PipelineOptions, SubstitutionPipeline};
use swapmatch::quota::QuotaGuard;
use swapmatch::ranking::MockRankingBackend;
use swapmatch::retrieval::MockVectorSearch;

use crate::gateway::handler::QUOTA_REMAINING_HEADER;
use crate::gateway::{GatewayState, create_router};

struct Fixture {
    app: Router,
    index: Arc<MockVectorSearch>,
    backend: Arc<MockRankingBackend>,
}

fn candidate(sku: &str) -> Candidate {
    Candidate {
        sku: sku.to_string(),
        score: 0.42,
        metadata: CandidateMetadata {
            supercategory: "Office Supplies".to_string(),
            category: "Paper".to_string(),
            class: String::new(),
            brand_name: "Acme".to_string(),
            web_price: 9.99,
            uom: "Ream".to_string(),
            uom_qty: 500,
            name: format!("Product {sku}"),
        },
        document: format!("Product: {sku}"),
    }
}

fn ranking_json(entries: &[(&str, u32, u32)]) -> String {
    let substitutes: Vec<serde_json::Value> = entries
        .iter()
        .map(|(sku, rank, qty)| {
            serde_json::json!({
                "sku": sku,
                "rank": rank,
                "reason": "close functional match",
                "unit_type": "DIVISIBLE",
                "qty_needed": qty,
                "comparison_notes": "2000 / 500 = 4",
            })
        })
        .collect();
    serde_json::json!({ "substitutes": substitutes }).to_string()
}

fn fixture(daily_quota: u32) -> Fixture {
    let catalog = Arc::new(MockCatalog::new());
    catalog.insert_product(MockCatalog::product("P1", "Recycled Paper", Some(7.49)));
    catalog.set_categories(vec![CategoryPair {
        supercategory: "Office Supplies".to_string(),
        category: "Paper".to_string(),
    }]);

    let index = Arc::new(MockVectorSearch::with_results(vec![candidate("P1")]));
    let backend = Arc::new(MockRankingBackend::with_response(ranking_json(&[(
        "P1", 1, 4,
    )])));

    let pipeline = Arc::new(SubstitutionPipeline::new(
        catalog.clone(),
        index.clone(),
        backend.clone(),
        PipelineOptions {
            candidate_pool: 20,
            max_substitutes: 5,
            cache_ttl: Duration::ZERO,
        },
    ));

    let state = GatewayState {
        pipeline,
        quota: Arc::new(QuotaGuard::new(daily_quota)),
        catalog,
        index: index.clone(),
    };

    Fixture {
        app: create_router(state),
        index,
        backend,
    }
}

fn paper_request_json() -> serde_json::Value {
    serde_json::json!({
        "name": "Copy Paper",
        "description": "8.5x11, 20lb",
        "supercategory": "Office Supplies",
        "category": "Paper",
        "quantity": 2000.0,
        "quantity_unit": "sheets",
        "total_price": 45.0
    })
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Collects the `data:` payloads of an SSE body as parsed JSON.
async fn sse_events(response: axum::response::Response) -> Vec<serde_json::Value> {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("body is UTF-8");

    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("event is JSON"))
        .collect()
}

#[tokio::test]
async fn health_returns_ok() {
    let f = fixture(50);
    let response = f
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn categories_are_delegated_to_the_catalog() {
    let f = fixture(50);
    let response = f
        .app
        .oneshot(
            Request::builder()
                .uri("/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["supercategory"], "Office Supplies");
    assert_eq!(json[0]["category"], "Paper");
}

#[tokio::test]
async fn missing_category_is_rejected_before_any_stream() {
    let f = fixture(50);
    let mut body = paper_request_json();
    body["category"] = serde_json::json!("");

    let response = f.app.oneshot(post_json("/substitute", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Both supercategory and category are required."
    );

    // No collaborator ran.
    assert_eq!(f.index.call_count(), 0);
    assert_eq!(f.backend.call_count(), 0);
}

#[tokio::test]
async fn quota_exhaustion_is_a_429_before_any_stream() {
    let f = fixture(1);

    let first = f
        .app
        .clone()
        .oneshot(post_json("/substitute", paper_request_json()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = f
        .app
        .oneshot(post_json("/substitute", paper_request_json()))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let json = body_json(second).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("daily request limit"));
    assert!(message.contains("resets"));
}

#[tokio::test]
async fn substitute_streams_statuses_then_a_single_result() {
    let f = fixture(50);
    let response = f
        .app
        .oneshot(post_json("/substitute", paper_request_json()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(QUOTA_REMAINING_HEADER).unwrap(),
        "49"
    );

    let events = sse_events(response).await;
    assert!(events.len() >= 2);
    assert_eq!(events[0]["type"], "status");
    assert_eq!(events[0]["stage"], "searching");

    let last = events.last().unwrap();
    assert_eq!(last["type"], "result");
    assert_eq!(last["candidates_evaluated"], 1);
    assert_eq!(last["substitutes"][0]["sku"], "P1");
    assert_eq!(last["substitutes"][0]["our_total_spend"], 29.96);
    assert_eq!(last["substitutes"][0]["savings"], 15.04);

    // Exactly one terminal event.
    let terminals = events
        .iter()
        .filter(|e| e["type"] == "result" || e["type"] == "error")
        .count();
    assert_eq!(terminals, 1);
}

#[tokio::test]
async fn collaborator_failure_becomes_a_terminal_error_event() {
    let f = fixture(50);
    f.index.fail_queries();

    let response = f
        .app
        .oneshot(post_json("/substitute", paper_request_json()))
        .await
        .unwrap();

    // The stream itself starts fine; the failure arrives in-band.
    assert_eq!(response.status(), StatusCode::OK);
    let events = sse_events(response).await;

    let last = events.last().unwrap();
    assert_eq!(last["type"], "error");
    assert!(last["message"].as_str().unwrap().contains("retrieval"));
}

#[tokio::test]
async fn reindex_reports_the_indexed_count() {
    let f = fixture(50);
    let response = f
        .app
        .oneshot(post_json("/index", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Indexing complete.");
    assert_eq!(json["indexed"], 1);
}

#[tokio::test]
async fn reindex_failure_maps_to_bad_gateway() {
    let f = fixture(50);
    f.index.fail_queries();

    let response = f
        .app
        .oneshot(post_json("/index", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
