use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::{collect_sorted, with_series, LabelSchema, Snapshot};
use crate::error::Result;

/// Monotonic counter family.
#[derive(Debug)]
pub struct Counter {
    schema: LabelSchema,
    series: DashMap<Vec<String>, AtomicU64>,
}

impl Counter {
    pub(crate) fn new(schema: LabelSchema) -> Self {
        let series = DashMap::new();
        // Unlabeled counters exist (at zero) from registration on.
        if schema.keys().is_empty() {
            series.insert(Vec::new(), AtomicU64::new(0));
        }
        Self { schema, series }
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.inc_by(labels, 1)
    }

    /// Increment by an arbitrary non-negative delta.
    pub fn inc_by(&self, labels: &[(&str, &str)], delta: u64) -> Result<()> {
        let key = self.schema.resolve(labels)?;
        with_series(
            &self.series,
            key,
            || AtomicU64::new(0),
            |c| c.fetch_add(delta, Ordering::Relaxed),
        );
        Ok(())
    }

    /// Current value of one series (0 if it was never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> Result<u64> {
        let key = self.schema.resolve(labels)?;
        Ok(self
            .series
            .get(&key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0))
    }

    pub fn snapshot(&self) -> Snapshot<u64> {
        Snapshot {
            label_keys: self.schema.keys().to_vec(),
            series: collect_sorted(&self.series, |c| c.load(Ordering::Relaxed)),
        }
    }
}
