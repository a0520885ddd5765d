//! Domain services called by the HTTP handlers.

pub mod predict;

pub use predict::{load_model, PredictionOutcome, PredictionService};
