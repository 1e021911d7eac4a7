//! Routes and handlers

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::pipeline::{CycleError, CycleOutcome, CycleReport, FetchPipeline};
use crate::storage::{PriceStore, StoreError};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<FetchPipeline>,
    pub store: Arc<dyn PriceStore>,
}

/// Build the service router with CORS and request tracing applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/gold-prices/fetch", post(fetch_prices))
        .route("/api/gold-prices/history", get(price_history))
        .route("/api/gold-prices/latest", get(latest_price))
        .route("/api/cron/update-prices", get(cron_update))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// JSON body for a completed cycle, in the shape clients consume.
pub fn report_body(report: &CycleReport) -> Value {
    let mut body = json!({
        "success": true,
        "saved": report.outcome.saved(),
        "prices": report.snapshot.to_json(),
        "updateTime": report.display_time,
    });
    if let CycleOutcome::Saved { id } = report.outcome {
        body["id"] = json!(id);
    }
    if let Some(reason) = report.outcome.reason() {
        body["reason"] = json!(reason);
    }
    if report.from_cache {
        body["fromCache"] = json!(true);
    }
    body
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "database": state.store.backend(),
    }))
}

async fn fetch_prices(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    run_cycle_response(&state).await
}

/// Same work as `fetch_prices`, reachable over GET for cron services that
/// can only issue GETs.
async fn cron_update(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    run_cycle_response(&state).await
}

async fn run_cycle_response(state: &AppState) -> (StatusCode, Json<Value>) {
    match state.pipeline.run_cycle().await {
        Ok(report) => (StatusCode::OK, Json(report_body(&report))),
        Err(e) => {
            error!("fetch cycle failed: {}", e);
            (
                cycle_error_status(&e),
                Json(json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

/// Upstream trouble is the gateway's fault, store trouble is ours.
fn cycle_error_status(error: &CycleError) -> StatusCode {
    match error {
        CycleError::Source(_) => StatusCode::BAD_GATEWAY,
        CycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn price_history(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.history().await {
        Ok(records) => {
            let data: Vec<Value> = records.iter().map(|record| record.to_json()).collect();
            (
                StatusCode::OK,
                Json(json!({ "success": true, "count": data.len(), "data": data })),
            )
        }
        Err(e) => store_error_response(e),
    }
}

async fn latest_price(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.latest().await {
        Ok(record) => {
            let data = record.map(|r| r.to_json()).unwrap_or(Value::Null);
            (
                StatusCode::OK,
                Json(json!({ "success": true, "data": data })),
            )
        }
        Err(e) => store_error_response(e),
    }
}

fn store_error_response(error: StoreError) -> (StatusCode, Json<Value>) {
    error!("store read failed: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": error.to_string() })),
    )
}

// =============================================================================
// Tests
// =============================================================================
