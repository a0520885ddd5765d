//! Background sampler state machine.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use modelwatch_server::config::SamplerSection;
use modelwatch_server::obs::sampler::{sample_once, Sampler, StopOutcome};

mod support;
use support::{seeded_model, state_with, FakeProbe};

async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test]
async fn samples_into_gauges_until_stopped() {
    let probe = Arc::new(FakeProbe::default());
    let state = state_with(seeded_model(), probe.clone());
    let sampler = state.sampler();
    let metrics = state.metrics();

    assert!(!sampler.is_running().await);
    sampler.start().await;
    assert!(sampler.is_running().await);

    assert!(wait_for(|| probe.calls() >= 3).await, "sampler never ticked");
    assert_eq!(metrics.cpu_usage.get(&[]).unwrap(), 12.5);
    assert_eq!(metrics.memory_usage.get(&[]).unwrap(), 256.0);

    assert_eq!(sampler.stop().await, StopOutcome::Exited);
    assert!(!sampler.is_running().await);

    // no more samples after stop
    let after = probe.calls();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(probe.calls(), after);
}

#[tokio::test]
async fn stop_within_first_interval_exits_on_cancellation() {
    let probe = Arc::new(FakeProbe::default());
    let state = state_with(seeded_model(), probe.clone());
    let metrics = state.metrics();
    let mut cfg = SamplerSection::default();
    cfg.interval_ms = 60_000;
    cfg.stop_timeout_ms = 5_000;
    let sampler = Sampler::new(probe.clone(), (*metrics).clone(), &cfg);

    sampler.start().await;
    // first tick fires immediately; the loop is then parked on the 60s tick
    assert!(wait_for(|| probe.calls() >= 1).await, "sampler never ticked");

    let started = Instant::now();
    let outcome = sampler.stop().await;
    assert_eq!(outcome, StopOutcome::Exited);
    assert!(started.elapsed() < Duration::from_secs(1), "exit relied on the stop deadline");
    assert!(!sampler.is_running().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stuck_sample_is_aborted_at_the_deadline() {
    let probe = Arc::new(FakeProbe::slow(1_000));
    let state = state_with(seeded_model(), probe.clone());
    let mut cfg = SamplerSection::default();
    cfg.interval_ms = 60_000;
    cfg.stop_timeout_ms = 50;
    let sampler = Sampler::new(probe.clone(), (*state.metrics()).clone(), &cfg);

    sampler.start().await;
    assert!(wait_for(|| probe.calls() >= 1).await, "sampler never ticked");

    let started = Instant::now();
    assert_eq!(sampler.stop().await, StopOutcome::Aborted);
    assert!(started.elapsed() < Duration::from_millis(900));
    assert!(!sampler.is_running().await);
}

#[tokio::test]
async fn stop_is_idempotent_and_start_twice_is_a_noop() {
    let state = state_with(seeded_model(), Arc::new(FakeProbe::default()));
    let sampler = state.sampler();

    assert_eq!(sampler.stop().await, StopOutcome::NotRunning);

    sampler.start().await;
    sampler.start().await;
    assert!(sampler.is_running().await);

    assert_eq!(sampler.stop().await, StopOutcome::Exited);
    assert_eq!(sampler.stop().await, StopOutcome::NotRunning);
    assert!(!sampler.is_running().await);

    // restartable after a stop
    sampler.start().await;
    assert!(sampler.is_running().await);
    sampler.stop().await;
}

#[tokio::test]
async fn probe_errors_do_not_stop_the_loop() {
    let probe = Arc::new(FakeProbe::failing());
    let state = state_with(seeded_model(), probe.clone());
    let sampler = state.sampler();

    sampler.start().await;
    assert!(wait_for(|| probe.calls() >= 3).await, "loop died after a failed sample");
    assert!(sampler.is_running().await);
    sampler.stop().await;

    // gauges were never written
    assert_eq!(state.metrics().cpu_usage.get(&[]).unwrap(), 0.0);
}

#[test]
fn sample_once_converts_bytes_to_megabytes() {
    let probe = FakeProbe::default();
    let state = state_with(seeded_model(), Arc::new(FakeProbe::default()));
    let metrics = state.metrics();

    sample_once(&probe, &metrics);
    assert_eq!(metrics.memory_usage.get(&[]).unwrap(), 256.0);
    assert_eq!(probe.calls(), 1);
}
