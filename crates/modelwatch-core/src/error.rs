//! Shared error type across modelwatch crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed or wrong-length request payload.
    BadRequest,
    /// Model inference failed.
    PredictionFailed,
    /// Programmer or startup error (metric schema, config, internal state).
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::PredictionFailed => "PREDICTION_FAILED",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status the boundary maps this code to.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest => 400,
            ClientCode::PredictionFailed | ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ModelWatchError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ModelWatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("prediction failed: {0}")]
    Prediction(String),
    #[error("metric {name} re-registered with a different schema: {reason}")]
    SchemaConflict { name: String, reason: String },
    #[error("metric {name}: invalid labels: {reason}")]
    InvalidLabel { name: String, reason: String },
    #[error("invalid metric or label name: {0}")]
    InvalidName(String),
    #[error("metric {name}: invalid buckets: {reason}")]
    InvalidBuckets { name: String, reason: String },
    #[error("sampling failed: {0}")]
    Sampling(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ModelWatchError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ModelWatchError::InvalidInput(_) => ClientCode::BadRequest,
            ModelWatchError::Prediction(_) => ClientCode::PredictionFailed,
            ModelWatchError::SchemaConflict { .. }
            | ModelWatchError::InvalidLabel { .. }
            | ModelWatchError::InvalidName(_)
            | ModelWatchError::InvalidBuckets { .. }
            | ModelWatchError::Sampling(_)
            | ModelWatchError::Config(_)
            | ModelWatchError::Internal(_) => ClientCode::Internal,
        }
    }
}
