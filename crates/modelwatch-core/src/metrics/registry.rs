use std::sync::{Arc, PoisonError, RwLock};

use super::{render, Counter, Gauge, Histogram, LabelSchema};
use crate::error::{ModelWatchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// Handle to a registered family.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Histogram(Arc<Histogram>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
        }
    }

    fn schema(&self) -> &LabelSchema {
        match self {
            Metric::Counter(c) => c.schema(),
            Metric::Gauge(g) => g.schema(),
            Metric::Histogram(h) => h.schema(),
        }
    }
}

#[derive(Debug)]
struct Family {
    name: String,
    help: String,
    metric: Metric,
}

/// Process-wide metric registry.
///
/// Construct once at startup and share it by `Arc`. Registration is
/// idempotent; rendering only holds the family-list lock long enough to clone
/// the handles, then snapshots each family on its own.
#[derive(Debug, Default)]
pub struct Registry {
    families: RwLock<Vec<Arc<Family>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str, help: &str, label_keys: &[&str]) -> Result<Arc<Counter>> {
        let m = self.register(name, help, MetricKind::Counter, label_keys, None, || {
            Metric::Counter(Arc::new(Counter::new(LabelSchema::new(name, label_keys))))
        })?;
        match m {
            Metric::Counter(c) => Ok(c),
            other => Err(kind_mismatch(name, other.kind(), MetricKind::Counter)),
        }
    }

    pub fn gauge(&self, name: &str, help: &str, label_keys: &[&str]) -> Result<Arc<Gauge>> {
        let m = self.register(name, help, MetricKind::Gauge, label_keys, None, || {
            Metric::Gauge(Arc::new(Gauge::new(LabelSchema::new(name, label_keys))))
        })?;
        match m {
            Metric::Gauge(g) => Ok(g),
            other => Err(kind_mismatch(name, other.kind(), MetricKind::Gauge)),
        }
    }

    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        label_keys: &[&str],
        buckets: &[f64],
    ) -> Result<Arc<Histogram>> {
        validate_buckets(name, buckets)?;
        if label_keys.contains(&"le") {
            return Err(ModelWatchError::InvalidName(format!(
                "{name}: label `le` is reserved for histogram buckets"
            )));
        }
        let m = self.register(
            name,
            help,
            MetricKind::Histogram,
            label_keys,
            Some(buckets),
            || {
                Metric::Histogram(Arc::new(Histogram::new(
                    LabelSchema::new(name, label_keys),
                    buckets.to_vec(),
                )))
            },
        )?;
        match m {
            Metric::Histogram(h) => Ok(h),
            other => Err(kind_mismatch(name, other.kind(), MetricKind::Histogram)),
        }
    }

    fn register(
        &self,
        name: &str,
        help: &str,
        kind: MetricKind,
        label_keys: &[&str],
        buckets: Option<&[f64]>,
        build: impl FnOnce() -> Metric,
    ) -> Result<Metric> {
        validate_metric_name(name)?;
        for k in label_keys {
            validate_label_name(k)?;
        }
        let mut seen: Vec<&str> = label_keys.to_vec();
        seen.sort_unstable();
        if seen.windows(2).any(|w| w[0] == w[1]) {
            return Err(ModelWatchError::InvalidName(format!(
                "{name}: duplicate label key"
            )));
        }

        let mut families = self.families.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(f) = families.iter().find(|f| f.name == name) {
            check_same_schema(f, kind, label_keys, buckets)?;
            return Ok(f.metric.clone());
        }

        let metric = build();
        families.push(Arc::new(Family {
            name: name.to_string(),
            help: help.to_string(),
            metric: metric.clone(),
        }));
        tracing::debug!(metric = %name, kind = kind.as_str(), "metric registered");
        Ok(metric)
    }

    /// Registered family names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    /// Look up a registered family by name.
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.metric.clone())
    }

    /// Render all families in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let families: Vec<Arc<Family>> = self
            .families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut out = String::new();
        for f in &families {
            render::header(&mut out, &f.name, &f.help, f.metric.kind().as_str());
            match &f.metric {
                Metric::Counter(c) => render::counter(&mut out, &f.name, &c.snapshot()),
                Metric::Gauge(g) => render::gauge(&mut out, &f.name, &g.snapshot()),
                Metric::Histogram(h) => render::histogram(&mut out, &f.name, &h.snapshot()),
            }
        }
        out
    }
}

fn kind_mismatch(name: &str, have: MetricKind, want: MetricKind) -> ModelWatchError {
    ModelWatchError::SchemaConflict {
        name: name.to_string(),
        reason: format!("registered as {}, requested as {}", have.as_str(), want.as_str()),
    }
}

fn check_same_schema(
    f: &Family,
    kind: MetricKind,
    label_keys: &[&str],
    buckets: Option<&[f64]>,
) -> Result<()> {
    if f.metric.kind() != kind {
        return Err(kind_mismatch(&f.name, f.metric.kind(), kind));
    }
    if !f.metric.schema().same_keys(label_keys) {
        return Err(ModelWatchError::SchemaConflict {
            name: f.name.clone(),
            reason: format!(
                "label keys {:?} differ from registered {:?}",
                label_keys,
                f.metric.schema().keys()
            ),
        });
    }
    if let (Metric::Histogram(h), Some(b)) = (&f.metric, buckets) {
        if h.bounds() != b {
            return Err(ModelWatchError::SchemaConflict {
                name: f.name.clone(),
                reason: "bucket layout differs from registered".into(),
            });
        }
    }
    Ok(())
}

fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ModelWatchError::InvalidName(format!("metric name `{name}`")))
    }
}

fn validate_label_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if ok && !name.starts_with("__") {
        Ok(())
    } else {
        Err(ModelWatchError::InvalidName(format!("label name `{name}`")))
    }
}

fn validate_buckets(name: &str, buckets: &[f64]) -> Result<()> {
    let invalid = |reason: &str| ModelWatchError::InvalidBuckets {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if buckets.is_empty() {
        return Err(invalid("at least one bucket bound is required"));
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err(invalid("bounds must be finite (+Inf is implicit)"));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("bounds must be strictly increasing"));
    }
    Ok(())
}
