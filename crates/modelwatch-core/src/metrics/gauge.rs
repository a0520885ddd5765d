use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::{collect_sorted, with_series, LabelSchema, Snapshot};
use crate::error::Result;

/// Gauge family. Values are `f64` stored as raw bits in an `AtomicU64`.
#[derive(Debug)]
pub struct Gauge {
    schema: LabelSchema,
    series: DashMap<Vec<String>, AtomicU64>,
}

fn zero() -> AtomicU64 {
    AtomicU64::new(0f64.to_bits())
}

impl Gauge {
    pub(crate) fn new(schema: LabelSchema) -> Self {
        let series = DashMap::new();
        if schema.keys().is_empty() {
            series.insert(Vec::new(), zero());
        }
        Self { schema, series }
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    /// Overwrite the current value.
    pub fn set(&self, labels: &[(&str, &str)], v: f64) -> Result<()> {
        let key = self.schema.resolve(labels)?;
        with_series(&self.series, key, zero, |g| {
            g.store(v.to_bits(), Ordering::Relaxed)
        });
        Ok(())
    }

    /// Add a signed delta (CAS loop, no lost updates).
    pub fn add(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        let key = self.schema.resolve(labels)?;
        with_series(&self.series, key, zero, |g| {
            let _ = g.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
        });
        Ok(())
    }

    pub fn sub(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        self.add(labels, -delta)
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.add(labels, 1.0)
    }

    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.add(labels, -1.0)
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Result<f64> {
        let key = self.schema.resolve(labels)?;
        Ok(self
            .series
            .get(&key)
            .map(|g| f64::from_bits(g.load(Ordering::Relaxed)))
            .unwrap_or(0.0))
    }

    pub fn snapshot(&self) -> Snapshot<f64> {
        Snapshot {
            label_keys: self.schema.keys().to_vec(),
            series: collect_sorted(&self.series, |g| {
                f64::from_bits(g.load(Ordering::Relaxed))
            }),
        }
    }
}
