//! Per-request instrumentation.
//!
//! [`RequestGuard`] raises the in-flight gauge on entry and does all exit
//! bookkeeping in `Drop`, so the outcome counter, the duration histogram and
//! the in-flight decrement run exactly once whether the handler returned a
//! response, unwound, or was dropped mid-flight. Without an explicit
//! [`complete`](RequestGuard::complete) the request counts as a 500.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;
use crate::obs::metrics::ServiceMetrics;

pub struct RequestGuard {
    metrics: Arc<ServiceMetrics>,
    method: String,
    endpoint: String,
    started: Instant,
    status: u16,
}

impl RequestGuard {
    pub fn enter(metrics: Arc<ServiceMetrics>, method: String, endpoint: String) -> Self {
        if let Err(e) = metrics.active_requests.inc(&[]) {
            tracing::error!(error = %e, "active request gauge update failed");
        }
        Self {
            metrics,
            method,
            endpoint,
            started: Instant::now(),
            status: 500,
        }
    }

    /// Record `status` as the outcome and finish the request.
    pub fn complete(mut self, status: u16) {
        self.status = status;
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        let status = self.status.to_string();
        let m = &self.metrics;

        if let Err(e) = m.requests.inc(&[
            ("method", self.method.as_str()),
            ("endpoint", self.endpoint.as_str()),
            ("status", status.as_str()),
        ]) {
            tracing::error!(error = %e, "request counter update failed");
        }
        let route = [
            ("method", self.method.as_str()),
            ("endpoint", self.endpoint.as_str()),
        ];
        if let Err(e) = m.request_duration.observe_duration(&route, elapsed) {
            tracing::error!(error = %e, "request duration update failed");
        }
        if let Err(e) = m.active_requests.dec(&[]) {
            tracing::error!(error = %e, "active request gauge update failed");
        }
    }
}

/// Endpoint label for requests no route matched. Raw paths are never used as
/// label values, so unknown URLs cannot grow the series maps.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Axum middleware wrapping every route (`from_fn_with_state`).
pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ENDPOINT.to_owned(), |p| p.as_str().to_owned());

    let guard = RequestGuard::enter(state.metrics(), method, endpoint);
    let response = next.run(req).await;
    guard.complete(response.status().as_u16());
    response
}
