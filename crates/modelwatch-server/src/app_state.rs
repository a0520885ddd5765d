//! Shared application state for the modelwatch server.
//!
//! The registry, metric handles, model, probe and sampler are built once here
//! and handed to handlers through axum state. Startup errors are returned, not
//! panicked on.

use std::sync::Arc;

use modelwatch_core::error::Result;
use modelwatch_core::metrics::Registry;
use modelwatch_core::model::Model;

use crate::config::ServerConfig;
use crate::obs::metrics::ServiceMetrics;
use crate::obs::probe::{ProcProbe, SystemProbe};
use crate::obs::sampler::Sampler;
use crate::services::{load_model, PredictionService};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    registry: Arc<Registry>,
    metrics: Arc<ServiceMetrics>,
    predictor: Arc<PredictionService>,
    probe: Arc<dyn SystemProbe>,
    sampler: Arc<Sampler>,
}

impl AppState {
    /// Build application state with the configured model and the procfs probe.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let model = load_model(&cfg.model)?;
        Self::with_parts(cfg, model, Arc::new(ProcProbe::new()))
    }

    /// Build application state around caller-supplied collaborators.
    pub fn with_parts(
        cfg: ServerConfig,
        model: Arc<dyn Model>,
        probe: Arc<dyn SystemProbe>,
    ) -> Result<Self> {
        cfg.validate()?;

        let registry = Arc::new(Registry::new());
        let metrics = ServiceMetrics::register(&registry, &cfg.buckets)?;
        let sampler = Sampler::new(Arc::clone(&probe), metrics.clone(), &cfg.sampler);
        let metrics = Arc::new(metrics);
        let predictor = PredictionService::new(model, Arc::clone(&metrics));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                metrics,
                predictor: Arc::new(predictor),
                probe,
                sampler: Arc::new(sampler),
            }),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn metrics(&self) -> Arc<ServiceMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn predictor(&self) -> Arc<PredictionService> {
        Arc::clone(&self.inner.predictor)
    }

    pub fn probe(&self) -> Arc<dyn SystemProbe> {
        Arc::clone(&self.inner.probe)
    }

    pub fn sampler(&self) -> Arc<Sampler> {
        Arc::clone(&self.inner.sampler)
    }
}
