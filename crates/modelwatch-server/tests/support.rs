//! Test collaborators shared by the server integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use modelwatch_core::error::{ModelWatchError, Result};
use modelwatch_core::model::{EnsembleModel, Model};
use modelwatch_server::app_state::AppState;
use modelwatch_server::config::ServerConfig;
use modelwatch_server::obs::probe::SystemProbe;

/// Probe returning fixed readings, optionally failing or slow, counting calls.
#[derive(Default)]
pub struct FakeProbe {
    pub calls: AtomicU64,
    pub fail: AtomicBool,
    pub delay_ms: AtomicU64,
}

impl FakeProbe {
    pub fn failing() -> Self {
        let p = Self::default();
        p.fail.store(true, Ordering::Relaxed);
        p
    }

    /// Blocks the calling thread for `ms` inside every cpu reading.
    pub fn slow(ms: u64) -> Self {
        let p = Self::default();
        p.delay_ms.store(ms, Ordering::Relaxed);
        p
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl SystemProbe for FakeProbe {
    fn current_cpu_percent(&self) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            std::thread::sleep(std::time::Duration::from_millis(delay));
        }
        if self.fail.load(Ordering::Relaxed) {
            return Err(ModelWatchError::Sampling("probe offline".into()));
        }
        Ok(12.5)
    }

    fn current_memory_used_bytes(&self) -> Result<u64> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(ModelWatchError::Sampling("probe offline".into()));
        }
        Ok(256 * 1024 * 1024)
    }
}

pub fn seeded_model() -> Arc<dyn Model> {
    Arc::new(EnsembleModel::seeded(20, 2, 10, 42).unwrap())
}

pub fn state_with(model: Arc<dyn Model>, probe: Arc<dyn SystemProbe>) -> AppState {
    let mut cfg = ServerConfig::default();
    cfg.sampler.interval_ms = 20;
    cfg.sampler.stop_timeout_ms = 500;
    AppState::with_parts(cfg, model, probe).unwrap()
}

pub fn test_state() -> AppState {
    state_with(seeded_model(), Arc::new(FakeProbe::default()))
}
