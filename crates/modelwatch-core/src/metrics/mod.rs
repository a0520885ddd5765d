//! In-process metrics (counter / gauge / histogram) with dynamic labels.
//!
//! Series live in `DashMap`s keyed by label values in declared-key order, so
//! writers to different series never contend and an existing series is
//! updated under a shard read lock only. Counters and gauges are plain
//! atomics; a histogram series keeps bucket counts, sum and count behind one
//! short-held mutex so a snapshot can never see a torn observation.
//!
//! The [`Registry`] owns every family and renders the Prometheus text
//! exposition format on demand.

mod counter;
mod gauge;
mod histogram;
mod labels;
mod registry;
mod render;

use std::sync::{Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::{Histogram, HistogramSeries};
pub use labels::LabelSchema;
pub use registry::{Metric, MetricKind, Registry};
pub use render::format_value;

/// Immutable point-in-time copy of one metric family's series.
///
/// Series are sorted by label values so two snapshots of an unchanged metric
/// compare (and render) identically.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub label_keys: Vec<String>,
    pub series: Vec<(Vec<String>, T)>,
}

impl<T> Snapshot<T> {
    /// Look up a series by label values given in declared-key order.
    pub fn get(&self, values: &[&str]) -> Option<&T> {
        self.series
            .iter()
            .find(|(k, _)| k.iter().map(String::as_str).eq(values.iter().copied()))
            .map(|(_, v)| v)
    }

    /// Value of the unlabeled series, if present.
    pub fn single(&self) -> Option<&T> {
        self.get(&[])
    }
}

/// Run `f` against the series for `key`, creating it with `init` on first use.
///
/// The common case (series already exists) only takes the shard read lock.
fn with_series<V, R>(
    map: &DashMap<Vec<String>, V>,
    key: Vec<String>,
    init: impl FnOnce() -> V,
    f: impl FnOnce(&V) -> R,
) -> R {
    if let Some(v) = map.get(&key) {
        return f(v.value());
    }
    let v = map.entry(key).or_insert_with(init);
    f(v.value())
}

/// Copy every series out of `map`, sorted by label values.
fn collect_sorted<V, T>(
    map: &DashMap<Vec<String>, V>,
    read: impl Fn(&V) -> T,
) -> Vec<(Vec<String>, T)> {
    let mut out: Vec<(Vec<String>, T)> = map
        .iter()
        .map(|r| (r.key().clone(), read(r.value())))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
