//! Observability: the service metric set, the request instrumentation
//! middleware, and the background host sampler.
//!
//! Every component receives the shared `Registry` explicitly; nothing here
//! reaches for a process global.

pub mod metrics;
pub mod middleware;
pub mod probe;
pub mod sampler;
