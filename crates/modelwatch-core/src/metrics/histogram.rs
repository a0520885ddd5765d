use std::sync::Mutex;
use std::time::Duration;

use dashmap::DashMap;

use super::{collect_sorted, lock, with_series, LabelSchema, Snapshot};
use crate::error::{ModelWatchError, Result};

/// Point-in-time copy of one histogram series.
///
/// `buckets` pairs each finite upper bound with its cumulative count; the
/// implicit `+Inf` bucket equals `count`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

#[derive(Debug)]
struct Cell {
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

/// Histogram family with bucket bounds fixed at registration.
#[derive(Debug)]
pub struct Histogram {
    schema: LabelSchema,
    bounds: Vec<f64>,
    series: DashMap<Vec<String>, Mutex<Cell>>,
}

impl Histogram {
    /// `bounds` must already be validated (finite, strictly increasing).
    pub(crate) fn new(schema: LabelSchema, bounds: Vec<f64>) -> Self {
        let h = Self {
            schema,
            bounds,
            series: DashMap::new(),
        };
        if h.schema.keys().is_empty() {
            h.series.insert(Vec::new(), h.empty_cell());
        }
        h
    }

    fn empty_cell(&self) -> Mutex<Cell> {
        Mutex::new(Cell {
            buckets: vec![0; self.bounds.len()],
            sum: 0.0,
            count: 0,
        })
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Record one observation: every bucket with bound >= `value`, the count
    /// and the sum move together under the series lock.
    pub fn observe(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(ModelWatchError::InvalidInput(format!(
                "{}: cannot observe NaN",
                self.schema.metric()
            )));
        }
        let key = self.schema.resolve(labels)?;
        let first = self.bounds.partition_point(|b| *b < value);
        with_series(
            &self.series,
            key,
            || self.empty_cell(),
            |cell| {
                let mut c = lock(cell);
                for n in &mut c.buckets[first..] {
                    *n += 1;
                }
                c.count += 1;
                c.sum += value;
            },
        );
        Ok(())
    }

    /// Observe a duration in seconds.
    pub fn observe_duration(&self, labels: &[(&str, &str)], d: Duration) -> Result<()> {
        self.observe(labels, d.as_secs_f64())
    }

    pub fn snapshot(&self) -> Snapshot<HistogramSeries> {
        Snapshot {
            label_keys: self.schema.keys().to_vec(),
            series: collect_sorted(&self.series, |cell| {
                let c = lock(cell);
                HistogramSeries {
                    buckets: self.bounds.iter().copied().zip(c.buckets.iter().copied()).collect(),
                    sum: c.sum,
                    count: c.count,
                }
            }),
        }
    }
}
