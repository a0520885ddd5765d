//! Registry registration rules and text exposition.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use modelwatch_core::metrics::{Metric, MetricKind, Registry};

#[test]
fn registration_is_idempotent() {
    let reg = Registry::new();
    let a = reg.counter("requests_total", "Requests", &["method", "status"]).unwrap();
    let b = reg.counter("requests_total", "Requests", &["status", "method"]).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    a.inc(&[("method", "GET"), ("status", "200")]).unwrap();
    assert_eq!(b.get(&[("method", "GET"), ("status", "200")]).unwrap(), 1);
    assert_eq!(reg.names(), vec!["requests_total".to_string()]);
}

#[test]
fn conflicting_registration_fails() {
    let reg = Registry::new();
    reg.counter("requests_total", "Requests", &["method"]).unwrap();

    let err = reg.gauge("requests_total", "Requests", &["method"]).expect_err("kind");
    assert!(matches!(err, modelwatch_core::ModelWatchError::SchemaConflict { .. }));

    let err = reg.counter("requests_total", "Requests", &["path"]).expect_err("labels");
    assert!(err.to_string().contains("label keys"));

    reg.histogram("latency", "Latency", &[], &[0.1, 1.0]).unwrap();
    let err = reg.histogram("latency", "Latency", &[], &[0.2, 1.0]).expect_err("buckets");
    assert!(err.to_string().contains("bucket layout"));

    assert!(matches!(reg.get("latency"), Some(Metric::Histogram(_))));
    assert_eq!(reg.get("latency").unwrap().kind(), MetricKind::Histogram);
}

#[test]
fn invalid_names_and_buckets_fail_fast() {
    let reg = Registry::new();
    assert!(reg.counter("1bad", "x", &[]).is_err());
    assert!(reg.counter("has-dash", "x", &[]).is_err());
    assert!(reg.counter("ok_name", "x", &["bad:label"]).is_err());
    assert!(reg.counter("ok_name", "x", &["__reserved"]).is_err());
    assert!(reg.counter("ok_name", "x", &["a", "a"]).is_err());
    assert!(reg.histogram("h", "x", &["le"], &[1.0]).is_err());

    assert!(reg.histogram("h", "x", &[], &[]).is_err());
    assert!(reg.histogram("h", "x", &[], &[1.0, 1.0]).is_err());
    assert!(reg.histogram("h", "x", &[], &[2.0, 1.0]).is_err());
    assert!(reg.histogram("h", "x", &[], &[1.0, f64::INFINITY]).is_err());

    // nothing half-registered
    assert!(reg.names().is_empty());
}

#[test]
fn render_matches_exposition_format() {
    let reg = Registry::new();
    let c = reg.counter("req_total", "Total requests", &["method", "status"]).unwrap();
    let h = reg.histogram("lat_seconds", "Latency", &[], &[0.1, 0.5, 1.0]).unwrap();
    let g = reg.gauge("temp", "Temperature", &[]).unwrap();
    reg.gauge("labeled_idle", "Never written", &["k"]).unwrap();

    c.inc(&[("method", "POST"), ("status", "500")]).unwrap();
    c.inc(&[("method", "GET"), ("status", "200")]).unwrap();
    c.inc(&[("method", "GET"), ("status", "200")]).unwrap();
    for v in [0.25, 0.5, 2.0] {
        h.observe(&[], v).unwrap();
    }
    g.set(&[], 1.5).unwrap();

    let expected = "\
# HELP req_total Total requests
# TYPE req_total counter
req_total{method=\"GET\",status=\"200\"} 2
req_total{method=\"POST\",status=\"500\"} 1
# HELP lat_seconds Latency
# TYPE lat_seconds histogram
lat_seconds_bucket{le=\"0.1\"} 0
lat_seconds_bucket{le=\"0.5\"} 2
lat_seconds_bucket{le=\"1\"} 2
lat_seconds_bucket{le=\"+Inf\"} 3
lat_seconds_sum 2.75
lat_seconds_count 3
# HELP temp Temperature
# TYPE temp gauge
temp 1.5
# HELP labeled_idle Never written
# TYPE labeled_idle gauge
";
    assert_eq!(reg.render(), expected);
}

#[test]
fn labeled_histogram_renders_le_last() {
    let reg = Registry::new();
    let h = reg
        .histogram("d_seconds", "Duration", &["method", "endpoint"], &[1.0])
        .unwrap();
    h.observe(&[("endpoint", "/predict"), ("method", "POST")], 0.5).unwrap();

    let out = reg.render();
    assert!(out.contains("d_seconds_bucket{method=\"POST\",endpoint=\"/predict\",le=\"1\"} 1\n"));
    assert!(out.contains("d_seconds_bucket{method=\"POST\",endpoint=\"/predict\",le=\"+Inf\"} 1\n"));
    assert!(out.contains("d_seconds_sum{method=\"POST\",endpoint=\"/predict\"} 0.5\n"));
    assert!(out.contains("d_seconds_count{method=\"POST\",endpoint=\"/predict\"} 1\n"));
}

#[test]
fn label_values_and_help_are_escaped() {
    let reg = Registry::new();
    let c = reg.counter("odd_total", "line one\nline \\two", &["path"]).unwrap();
    c.inc(&[("path", "/a\"b")]).unwrap();

    let out = reg.render();
    assert!(out.contains("# HELP odd_total line one\\nline \\\\two\n"));
    assert!(out.contains("odd_total{path=\"/a\\\"b\"} 1\n"));
}

#[test]
fn render_is_stable_without_writes() {
    let reg = Registry::new();
    let c = reg.counter("c_total", "c", &["k"]).unwrap();
    for k in ["z", "a", "m", "b"] {
        c.inc(&[("k", k)]).unwrap();
    }
    let g = reg.gauge("g", "g", &["k"]).unwrap();
    g.set(&[("k", "y")], 3.0).unwrap();
    g.set(&[("k", "x")], 4.0).unwrap();

    let first = reg.render();
    let second = reg.render();
    assert_eq!(first, second);
    let a = first.find("c_total{k=\"a\"}").unwrap();
    let z = first.find("c_total{k=\"z\"}").unwrap();
    assert!(a < z);
}

#[test]
fn render_completes_while_writers_run() {
    let reg = Arc::new(Registry::new());
    let c = reg.counter("busy_total", "busy", &["worker"]).unwrap();
    let h = reg.histogram("busy_seconds", "busy", &["worker"], &[0.5, 1.0]).unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let c = Arc::clone(&c);
            let h = Arc::clone(&h);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let w = i.to_string();
                let mut n = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    c.inc(&[("worker", w.as_str())]).unwrap();
                    h.observe(&[("worker", w.as_str())], 0.75).unwrap();
                    n += 1;
                }
                n
            })
        })
        .collect();

    for _ in 0..100 {
        let out = reg.render();
        assert!(out.starts_with("# HELP busy_total busy\n"));
    }
    stop.store(true, Ordering::Relaxed);

    let total: u64 = writers.into_iter().map(|w| w.join().unwrap()).sum();
    let snap = c.snapshot();
    let counted: u64 = snap.series.iter().map(|(_, v)| *v).sum();
    assert_eq!(counted, total);
    let observed: u64 = h.snapshot().series.iter().map(|(_, s)| s.count).sum();
    assert_eq!(observed, total);
}
