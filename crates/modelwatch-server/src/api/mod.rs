//! Prediction API and the HTTP error boundary.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use modelwatch_core::error::{ClientCode, ModelWatchError};

use crate::app_state::AppState;

/// Maps a `ModelWatchError` to its HTTP status and a `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError(pub ModelWatchError);

impl From<ModelWatchError> for ApiError {
    fn from(e: ModelWatchError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let msg = match (&self.0, code) {
            (ModelWatchError::InvalidInput(m), _) => m.clone(),
            (_, ClientCode::PredictionFailed) => "Prediction failed".to_string(),
            _ => "Internal error".to_string(),
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = code.as_str(), "request failed");
        }
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: usize,
    pub probability: f64,
    pub response_time: f64,
}

/// `POST /predict` with a JSON array of exactly N floats.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Vec<f64>>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(features) = body.map_err(|e| {
        ModelWatchError::InvalidInput(format!(
            "Exactly {} features required: {}",
            state.predictor().n_features(),
            e.body_text()
        ))
    })?;

    let svc = state.predictor();
    let outcome = tokio::task::spawn_blocking(move || svc.predict(&features))
        .await
        .map_err(|e| ModelWatchError::Internal(format!("inference task failed: {e}")))??;

    Ok(Json(PredictResponse {
        prediction: outcome.class,
        probability: outcome.probability,
        response_time: outcome.response_time,
    }))
}
