use crate::error::{ModelWatchError, Result};

/// Declared label keys of one metric family.
///
/// Callers pass labels as `(key, value)` pairs in any order; [`resolve`]
/// turns them into the series key (values in declared-key order) or rejects
/// them when the key set does not match the declaration exactly.
///
/// [`resolve`]: LabelSchema::resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    metric: String,
    keys: Vec<String>,
}

impl LabelSchema {
    pub fn new(metric: &str, keys: &[&str]) -> Self {
        Self {
            metric: metric.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// True when `keys` names the same label set (order-insensitive).
    pub fn same_keys(&self, keys: &[&str]) -> bool {
        let mut a: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        let mut b: Vec<&str> = keys.to_vec();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    /// Map caller labels to the series key.
    pub fn resolve(&self, labels: &[(&str, &str)]) -> Result<Vec<String>> {
        if let Some((k, _)) = labels
            .iter()
            .find(|(k, _)| !self.keys.iter().any(|d| d == k))
        {
            return Err(self.invalid(format!("unknown label `{k}`")));
        }

        let mut values = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let mut hits = labels.iter().filter(|(k, _)| *k == key.as_str());
            match (hits.next(), hits.next()) {
                (Some((_, v)), None) => values.push((*v).to_string()),
                (None, _) => return Err(self.invalid(format!("missing label `{key}`"))),
                (Some(_), Some(_)) => {
                    return Err(self.invalid(format!("duplicate label `{key}`")))
                }
            }
        }
        Ok(values)
    }

    fn invalid(&self, reason: String) -> ModelWatchError {
        ModelWatchError::InvalidLabel {
            name: self.metric.clone(),
            reason,
        }
    }
}
