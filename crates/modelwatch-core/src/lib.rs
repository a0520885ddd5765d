//! modelwatch core: runtime-free metric primitives, the metrics registry and
//! its text exposition, the model collaborator contract, and the shared error
//! type.
//!
//! This crate carries no async runtime or HTTP dependencies so the metrics
//! subsystem can be driven from plain threads (tests, benches) as well as from
//! the tokio server.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Poisoned locks are recovered rather than propagated: every critical section
//! in this crate leaves its data consistent before it can unwind.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;
pub mod model;

/// Shared result type.
pub use error::{ClientCode, ModelWatchError, Result};
