//! Model collaborator contract and the stock ensemble classifier.
//!
//! The service only needs `predict`; how the weights came to be is outside
//! this crate. [`EnsembleModel`] is either loaded from a JSON artifact or
//! built deterministically from a seed at startup.

mod ensemble;

use serde::Serialize;

use crate::error::Result;

pub use ensemble::{EnsembleModel, Estimator};

/// Output of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Index of the most probable class.
    pub class: usize,
    /// Probability of `class`, in `[0, 1]`.
    pub probability: f64,
    /// Probability per class; sums to 1.
    pub class_probabilities: Vec<f64>,
}

/// Inference collaborator consumed by the prediction service.
pub trait Model: Send + Sync {
    /// Trained input dimensionality.
    fn n_features(&self) -> usize;

    /// Classify one feature vector of length `n_features()`.
    fn predict(&self, features: &[f64]) -> Result<Prediction>;
}

/// Stand-in for a model that failed to load; every call fails.
#[derive(Debug, Clone)]
pub struct UnavailableModel {
    n_features: usize,
}

impl UnavailableModel {
    pub fn new(n_features: usize) -> Self {
        Self { n_features }
    }
}

impl Model for UnavailableModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, _features: &[f64]) -> Result<Prediction> {
        Err(crate::ModelWatchError::Prediction("model not loaded".into()))
    }
}
