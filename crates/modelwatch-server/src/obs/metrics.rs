//! Named metric families exported by the service.

use std::sync::Arc;

use modelwatch_core::error::Result;
use modelwatch_core::metrics::{Counter, Gauge, Histogram, Registry};

use crate::config::BucketConfig;

pub const REQUESTS_TOTAL: &str = "modelwatch_requests_total";
pub const REQUEST_DURATION: &str = "modelwatch_request_duration_seconds";
pub const PREDICTIONS_TOTAL: &str = "modelwatch_predictions_total";
pub const PREDICTION_PROBABILITY: &str = "modelwatch_prediction_probability";
pub const RESPONSE_TIME: &str = "modelwatch_response_time_seconds";
pub const CPU_USAGE: &str = "modelwatch_cpu_usage_percent";
pub const MEMORY_USAGE: &str = "modelwatch_memory_usage_mb";
pub const ACTIVE_REQUESTS: &str = "modelwatch_active_requests";

/// Handles to every family the service writes.
///
/// Registration happens once at startup; a schema conflict here is a
/// programming error and fails boot.
#[derive(Clone)]
pub struct ServiceMetrics {
    pub requests: Arc<Counter>,         // {method, endpoint, status}
    pub request_duration: Arc<Histogram>, // {method, endpoint}
    pub predictions: Arc<Counter>,
    pub prediction_probability: Arc<Histogram>,
    pub response_time: Arc<Histogram>,
    pub cpu_usage: Arc<Gauge>,
    pub memory_usage: Arc<Gauge>,
    pub active_requests: Arc<Gauge>,
}

impl ServiceMetrics {
    pub fn register(reg: &Registry, buckets: &BucketConfig) -> Result<Self> {
        Ok(Self {
            requests: reg.counter(
                REQUESTS_TOTAL,
                "Total number of requests served",
                &["method", "endpoint", "status"],
            )?,
            request_duration: reg.histogram(
                REQUEST_DURATION,
                "Request duration in seconds",
                &["method", "endpoint"],
                &buckets.request_duration,
            )?,
            predictions: reg.counter(PREDICTIONS_TOTAL, "Total number of predictions made", &[])?,
            prediction_probability: reg.histogram(
                PREDICTION_PROBABILITY,
                "Prediction probability distribution",
                &[],
                &buckets.prediction_probability,
            )?,
            response_time: reg.histogram(
                RESPONSE_TIME,
                "Response time for predictions",
                &[],
                &buckets.response_time,
            )?,
            cpu_usage: reg.gauge(CPU_USAGE, "CPU usage percentage", &[])?,
            memory_usage: reg.gauge(MEMORY_USAGE, "Memory usage in MB", &[])?,
            active_requests: reg.gauge(ACTIVE_REQUESTS, "Number of active requests", &[])?,
        })
    }
}
