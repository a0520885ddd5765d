//! Top-level facade crate for modelwatch.
//!
//! Re-exports the core metrics/model types and the server library so users can
//! depend on a single crate.

pub mod core {
    pub use modelwatch_core::*;
}

pub mod server {
    pub use modelwatch_server::*;
}
