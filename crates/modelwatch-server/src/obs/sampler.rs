//! Background host sampler.
//!
//! `Stopped -> Running -> Stopped`. The sampling task writes CPU percent and
//! memory used (MB) into their gauges every interval; a failed reading is
//! logged and the loop carries on. `stop()` cancels the task and waits a
//! bounded time for it, aborting it if the wait expires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SamplerSection;
use crate::obs::metrics::ServiceMetrics;
use crate::obs::probe::SystemProbe;

/// How a [`Sampler::stop`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running.
    NotRunning,
    /// The task saw its cancellation token and returned.
    Exited,
    /// The task ended with a panic or was cancelled by the runtime.
    Failed,
    /// The task missed the stop deadline and was aborted.
    Aborted,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Sampler {
    probe: Arc<dyn SystemProbe>,
    metrics: ServiceMetrics,
    interval: Duration,
    stop_timeout: Duration,
    state: Mutex<Option<Running>>,
}

impl Sampler {
    pub fn new(probe: Arc<dyn SystemProbe>, metrics: ServiceMetrics, cfg: &SamplerSection) -> Self {
        Self {
            probe,
            metrics,
            interval: Duration::from_millis(cfg.interval_ms),
            stop_timeout: Duration::from_millis(cfg.stop_timeout_ms),
            state: Mutex::new(None),
        }
    }

    /// Spawn the sampling task. A second call while running is a no-op.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::warn!("sampler already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.probe),
            self.metrics.clone(),
            self.interval,
            cancel.clone(),
        ));
        *state = Some(Running { cancel, handle });
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "sampler started");
    }

    /// Cancel the sampling task and wait (bounded) for it to exit. Idempotent.
    pub async fn stop(&self) -> StopOutcome {
        let Some(Running { cancel, mut handle }) = self.state.lock().await.take() else {
            return StopOutcome::NotRunning;
        };
        cancel.cancel();

        match tokio::time::timeout(self.stop_timeout, &mut handle).await {
            Ok(Ok(())) => {
                tracing::info!("sampler stopped");
                StopOutcome::Exited
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "sampler task ended abnormally");
                StopOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.stop_timeout.as_millis() as u64,
                    "sampler did not stop in time, aborting"
                );
                handle.abort();
                StopOutcome::Aborted
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

async fn run(
    probe: Arc<dyn SystemProbe>,
    metrics: ServiceMetrics,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut tick = tokio::time::interval(every);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => sample_once(probe.as_ref(), &metrics),
        }
    }
}

/// Take one reading of each gauge; failures are logged, never propagated.
pub fn sample_once(probe: &dyn SystemProbe, metrics: &ServiceMetrics) {
    match probe.current_cpu_percent() {
        Ok(pct) => {
            if let Err(e) = metrics.cpu_usage.set(&[], pct) {
                tracing::warn!(error = %e, "cpu gauge update failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "cpu sample failed"),
    }

    match probe.current_memory_used_bytes() {
        Ok(bytes) => {
            if let Err(e) = metrics.memory_usage.set(&[], bytes as f64 / 1024.0 / 1024.0) {
                tracing::warn!(error = %e, "memory gauge update failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "memory sample failed"),
    }
}
