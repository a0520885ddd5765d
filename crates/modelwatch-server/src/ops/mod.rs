//! Operational HTTP endpoints.
//!
//! - `/`        : static status
//! - `/health`  : liveness + host cpu/memory
//! - `/metrics` : Prometheus text format

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use modelwatch_core::error::ModelWatchError;

use crate::app_state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "ML Model Monitoring API", "status": "healthy" }))
}

/// CPU percent is the sampler's last reading, so the sampler alone advances the
/// probe's CPU baseline. Memory is read live off the executor and falls back to
/// the sampled gauge.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let probe = state.probe();
    let metrics = state.metrics();

    let cpu_percent = metrics.cpu_usage.get(&[]).unwrap_or(0.0);
    let memory_used_mb = tokio::task::spawn_blocking(move || probe.current_memory_used_bytes())
        .await
        .map_err(|e| ModelWatchError::Internal(format!("memory probe task failed: {e}")))
        .and_then(|r| r)
        .map(|b| b as f64 / 1024.0 / 1024.0)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "health memory probe failed");
            metrics.memory_usage.get(&[]).unwrap_or(0.0)
        });
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();

    Json(json!({
        "status": "healthy",
        "timestamp": timestamp,
        "system": {
            "cpu_percent": cpu_percent,
            "memory_used_mb": memory_used_mb,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.registry().render();

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
