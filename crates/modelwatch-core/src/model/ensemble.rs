use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Model, Prediction};
use crate::error::{ModelWatchError, Result};

/// One member of the ensemble: a multinomial logistic scorer.
///
/// `weights[c]` and `bias[c]` produce the logit of class `c`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Estimator {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl Estimator {
    fn class_probabilities(&self, features: &[f64], out: &mut [f64]) {
        let logits: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| saturating_dot(*b, w, features))
            .collect();
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        for (o, e) in out.iter_mut().zip(exps) {
            *o += e / total;
        }
    }
}

/// `bias + w . x`, held inside the finite range at every step so extreme but
/// finite inputs cannot produce `Inf - Inf` in the softmax.
fn saturating_dot(bias: f64, weights: &[f64], features: &[f64]) -> f64 {
    weights
        .iter()
        .zip(features)
        .fold(bias, |acc, (w, x)| (acc + w * x).clamp(f64::MIN, f64::MAX))
}

/// Averaged ensemble of [`Estimator`]s (soft voting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnsembleModel {
    n_features: usize,
    n_classes: usize,
    estimators: Vec<Estimator>,
}

impl EnsembleModel {
    pub fn new(n_features: usize, n_classes: usize, estimators: Vec<Estimator>) -> Result<Self> {
        let m = Self {
            n_features,
            n_classes,
            estimators,
        };
        m.validate()?;
        Ok(m)
    }

    /// Build a deterministic ensemble from `seed`.
    ///
    /// Each estimator sees a random half of the features (the rest weigh
    /// zero), which keeps members decorrelated the way bagging would.
    pub fn seeded(n_features: usize, n_classes: usize, n_estimators: usize, seed: u64) -> Result<Self> {
        let mut rng = SplitMix64(seed);
        let estimators = (0..n_estimators)
            .map(|_| Estimator {
                weights: (0..n_classes)
                    .map(|_| {
                        (0..n_features)
                            .map(|_| {
                                let w = rng.next_unit() * 2.0 - 1.0;
                                if rng.next_unit() < 0.5 { w } else { 0.0 }
                            })
                            .collect()
                    })
                    .collect(),
                bias: (0..n_classes).map(|_| (rng.next_unit() - 0.5) * 0.2).collect(),
            })
            .collect();
        Self::new(n_features, n_classes, estimators)
    }

    /// Load a JSON artifact written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|e| {
            ModelWatchError::Config(format!("read model artifact {} failed: {e}", path.display()))
        })?;
        let m: Self = serde_json::from_str(&s)
            .map_err(|e| ModelWatchError::Config(format!("invalid model artifact: {e}")))?;
        m.validate()?;
        Ok(m)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let s = serde_json::to_string_pretty(self)
            .map_err(|e| ModelWatchError::Internal(format!("encode model artifact: {e}")))?;
        fs::write(path.as_ref(), s).map_err(|e| {
            ModelWatchError::Config(format!(
                "write model artifact {} failed: {e}",
                path.as_ref().display()
            ))
        })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }

    fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(ModelWatchError::Config(format!("invalid model: {msg}")));
        if self.n_features == 0 {
            return bad("n_features must be > 0".into());
        }
        if self.n_classes < 2 {
            return bad("at least 2 classes required".into());
        }
        if self.estimators.is_empty() {
            return bad("at least 1 estimator required".into());
        }
        for (i, e) in self.estimators.iter().enumerate() {
            if e.weights.len() != self.n_classes || e.bias.len() != self.n_classes {
                return bad(format!("estimator {i}: expected {} classes", self.n_classes));
            }
            if e.weights.iter().any(|w| w.len() != self.n_features) {
                return bad(format!("estimator {i}: expected {} weights per class", self.n_features));
            }
            let finite = e.weights.iter().flatten().chain(&e.bias).all(|v| v.is_finite());
            if !finite {
                return bad(format!("estimator {i}: non-finite parameter"));
            }
        }
        Ok(())
    }
}

impl Model for EnsembleModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction> {
        if features.len() != self.n_features {
            return Err(ModelWatchError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        if features.iter().any(|x| !x.is_finite()) {
            return Err(ModelWatchError::InvalidInput("features must be finite".into()));
        }

        let mut probs = vec![0.0; self.n_classes];
        for e in &self.estimators {
            e.class_probabilities(features, &mut probs);
        }
        let n = self.estimators.len() as f64;
        for p in &mut probs {
            *p /= n;
        }

        let (class, probability) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });
        if !probability.is_finite() {
            return Err(ModelWatchError::Prediction("non-finite class probability".into()));
        }

        Ok(Prediction {
            class,
            probability: probability.clamp(0.0, 1.0),
            class_probabilities: probs,
        })
    }
}

/// Tiny deterministic generator for seeded weights.
struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
