//! Prediction service adapter: validates input, calls the model, records the
//! prediction-specific metrics on success.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use modelwatch_core::error::{ModelWatchError, Result};
use modelwatch_core::model::{EnsembleModel, Model};

use crate::config::ModelSection;
use crate::obs::metrics::ServiceMetrics;

#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub class: usize,
    pub probability: f64,
    pub class_probabilities: Vec<f64>,
    /// Wall-clock inference latency in seconds.
    pub response_time: f64,
}

pub struct PredictionService {
    model: Arc<dyn Model>,
    metrics: Arc<ServiceMetrics>,
}

impl PredictionService {
    pub fn new(model: Arc<dyn Model>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { model, metrics }
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    /// Blocking; run it off the async executor.
    pub fn predict(&self, features: &[f64]) -> Result<PredictionOutcome> {
        let want = self.model.n_features();
        if features.len() != want {
            return Err(ModelWatchError::InvalidInput(format!(
                "Exactly {want} features required"
            )));
        }
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(ModelWatchError::InvalidInput(format!(
                "feature {i} is not a finite number"
            )));
        }

        let started = Instant::now();
        let p = self.model.predict(features).map_err(|e| {
            tracing::error!(error = %e, "prediction error");
            match e {
                ModelWatchError::Prediction(_) => e,
                other => ModelWatchError::Prediction(other.to_string()),
            }
        })?;
        let response_time = started.elapsed().as_secs_f64();

        self.record(p.probability, response_time);
        tracing::info!(
            prediction = p.class,
            probability = format_args!("{:.3}", p.probability),
            response_time = format_args!("{:.3}s", response_time),
            "prediction made"
        );

        Ok(PredictionOutcome {
            class: p.class,
            probability: p.probability,
            class_probabilities: p.class_probabilities,
            response_time,
        })
    }

    fn record(&self, probability: f64, response_time: f64) {
        let m = &self.metrics;
        let results = [
            m.predictions.inc(&[]),
            m.prediction_probability.observe(&[], probability),
            m.response_time.observe(&[], response_time),
        ];
        for e in results.into_iter().filter_map(|r| r.err()) {
            tracing::error!(error = %e, "prediction metric update failed");
        }
    }
}

/// Load the model artifact if it exists, otherwise build the seeded ensemble
/// (and save it when configured to).
pub fn load_model(cfg: &ModelSection) -> Result<Arc<dyn Model>> {
    if let Some(path) = cfg.artifact.as_deref() {
        if Path::new(path).exists() {
            let m = EnsembleModel::load(path)?;
            if m.n_features() != cfg.n_features {
                tracing::warn!(
                    artifact_features = m.n_features(),
                    configured_features = cfg.n_features,
                    "model artifact dimensionality overrides config"
                );
            }
            tracing::info!(%path, estimators = m.n_estimators(), "model loaded from disk");
            return Ok(Arc::new(m));
        }
    }

    let m = EnsembleModel::seeded(cfg.n_features, cfg.n_classes, cfg.n_estimators, cfg.seed)?;
    tracing::info!(
        features = cfg.n_features,
        classes = cfg.n_classes,
        estimators = cfg.n_estimators,
        seed = cfg.seed,
        "model built from seed"
    );

    if let (true, Some(path)) = (cfg.save_artifact, cfg.artifact.as_deref()) {
        match m.save(path) {
            Ok(()) => tracing::info!(%path, "model saved"),
            Err(e) => tracing::warn!(error = %e, "model save failed"),
        }
    }
    Ok(Arc::new(m))
}
