use serde::Deserialize;
use modelwatch_core::error::{ModelWatchError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub sampler: SamplerSection,

    #[serde(default)]
    pub model: ModelSection,

    #[serde(default)]
    pub buckets: BucketConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            sampler: SamplerSection::default(),
            model: ModelSection::default(),
            buckets: BucketConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ModelWatchError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.sampler.validate()?;
        self.model.validate()?;
        self.buckets.validate()?;

        Ok(())
    }
}

fn bad(msg: &str) -> ModelWatchError {
    ModelWatchError::Config(msg.to_string())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<std::net::SocketAddr>()
            .map_err(|_| bad("server.listen must be a valid SocketAddr"))?;
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound on how long `stop()` waits for the sampling task.
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl SamplerSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=3_600_000).contains(&self.interval_ms) {
            return Err(bad("sampler.interval_ms must be between 10 and 3600000"));
        }
        if !(1..=60_000).contains(&self.stop_timeout_ms) {
            return Err(bad("sampler.stop_timeout_ms must be between 1 and 60000"));
        }
        Ok(())
    }
}

fn default_interval_ms() -> u64 {
    5000
}
fn default_stop_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    #[serde(default = "default_n_features")]
    pub n_features: usize,

    #[serde(default = "default_n_classes")]
    pub n_classes: usize,

    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// JSON artifact; loaded when present, otherwise the seeded model is built.
    #[serde(default)]
    pub artifact: Option<String>,

    /// Write the seeded model to `artifact` when it had to be built.
    #[serde(default)]
    pub save_artifact: bool,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            n_features: default_n_features(),
            n_classes: default_n_classes(),
            n_estimators: default_n_estimators(),
            seed: default_seed(),
            artifact: None,
            save_artifact: false,
        }
    }
}

impl ModelSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=4096).contains(&self.n_features) {
            return Err(bad("model.n_features must be between 1 and 4096"));
        }
        if !(2..=1024).contains(&self.n_classes) {
            return Err(bad("model.n_classes must be between 2 and 1024"));
        }
        if !(1..=1000).contains(&self.n_estimators) {
            return Err(bad("model.n_estimators must be between 1 and 1000"));
        }
        if self.save_artifact && self.artifact.is_none() {
            return Err(bad("model.save_artifact requires model.artifact"));
        }
        Ok(())
    }
}

fn default_n_features() -> usize {
    20
}
fn default_n_classes() -> usize {
    2
}
fn default_n_estimators() -> usize {
    100
}
fn default_seed() -> u64 {
    42
}

/// Explicit histogram bucket bounds (seconds for durations).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
    #[serde(default = "default_latency_buckets")]
    pub request_duration: Vec<f64>,

    #[serde(default = "default_probability_buckets")]
    pub prediction_probability: Vec<f64>,

    #[serde(default = "default_latency_buckets")]
    pub response_time: Vec<f64>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            request_duration: default_latency_buckets(),
            prediction_probability: default_probability_buckets(),
            response_time: default_latency_buckets(),
        }
    }
}

impl BucketConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, b) in [
            ("buckets.request_duration", &self.request_duration),
            ("buckets.prediction_probability", &self.prediction_probability),
            ("buckets.response_time", &self.response_time),
        ] {
            if b.is_empty() {
                return Err(ModelWatchError::Config(format!("{name} must not be empty")));
            }
            if b.iter().any(|v| !v.is_finite()) || b.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ModelWatchError::Config(format!(
                    "{name} must be finite and strictly increasing"
                )));
            }
        }
        Ok(())
    }
}

fn default_latency_buckets() -> Vec<f64> {
    vec![
        0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
    ]
}

fn default_probability_buckets() -> Vec<f64> {
    vec![0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.99, 1.0]
}
