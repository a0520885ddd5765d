//! modelwatch server library entry.
//!
//! Wires config, the metric registry, the background sampler, request
//! instrumentation and the prediction service into an axum application. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
