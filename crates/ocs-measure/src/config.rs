//! Harness configuration.
//!
//! Values come from an optional YAML file, then environment variables, then
//! command-line flags (applied by the binary).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{DEFAULT_CLUSTER_NAMESPACE, MEASUREMENT_RESULTS_DIR};
use crate::error::MeasureError;
use crate::prometheus::PrometheusConfig;

/// Environment variable overriding `env_data.cluster_namespace`.
pub const ENV_CLUSTER_NAMESPACE: &str = "CLUSTER_NAMESPACE";
/// Environment variable overriding `env_data.measurement_dir`.
pub const ENV_MEASUREMENT_DIR: &str = "MEASUREMENT_DIR";
/// Environment variable overriding `prometheus.base_url`.
pub const ENV_PROMETHEUS_URL: &str = "PROMETHEUS_URL";
/// Environment variable overriding `prometheus.bearer_token`.
pub const ENV_PROMETHEUS_TOKEN: &str = "PROMETHEUS_TOKEN";

/// Cluster environment data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvData {
    /// Namespace the Ceph daemons run in
    pub cluster_namespace: String,
    /// Where result files are kept between runs
    pub measurement_dir: Option<PathBuf>,
}

impl Default for EnvData {
    fn default() -> Self {
        Self {
            cluster_namespace: DEFAULT_CLUSTER_NAMESPACE.to_string(),
            measurement_dir: None,
        }
    }
}

impl EnvData {
    /// Configured measurement dir, or `measurement_results` in the system
    /// temp directory.
    pub fn resolve_measurement_dir(&self) -> PathBuf {
        self.measurement_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(MEASUREMENT_RESULTS_DIR))
    }

    /// Resolve the measurement dir and create it if needed.
    pub fn ensure_measurement_dir(&self) -> Result<PathBuf, MeasureError> {
        let dir = self.resolve_measurement_dir();
        if self.measurement_dir.is_some() {
            info!(dir = %dir.display(), "Using measurement dir from configuration");
        }
        if !dir.exists() {
            info!(dir = %dir.display(), "Measurement dir doesn't exist, creating it");
            std::fs::create_dir_all(&dir).map_err(|e| MeasureError::io(&dir, e))?;
        }
        Ok(dir)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "ENV_DATA")]
    pub env_data: EnvData,
    pub prometheus: PrometheusConfig,
    /// Seconds between two alert queries
    pub alert_poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env_data: EnvData::default(),
            prometheus: PrometheusConfig::default(),
            alert_poll_interval_secs: crate::constants::ALERT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl Config {
    /// Load from `path` (defaults when `None`) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, MeasureError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, MeasureError> {
        let content = std::fs::read_to_string(path).map_err(|e| MeasureError::io(path, e))?;
        Self::from_yaml(&content)
            .map_err(|e| MeasureError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_yaml(content: &str) -> Result<Self, MeasureError> {
        serde_yaml::from_str(content).map_err(|e| MeasureError::Config(e.to_string()))
    }

    /// Apply overrides from `lookup`, normally `std::env::var`.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(namespace) = get(ENV_CLUSTER_NAMESPACE) {
            self.env_data.cluster_namespace = namespace;
        }
        if let Some(dir) = get(ENV_MEASUREMENT_DIR) {
            self.env_data.measurement_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = get(ENV_PROMETHEUS_URL) {
            self.prometheus.base_url = url;
        }
        if let Some(token) = get(ENV_PROMETHEUS_TOKEN) {
            self.prometheus.bearer_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), MeasureError> {
        if self.env_data.cluster_namespace.trim().is_empty() {
            return Err(MeasureError::Config(
                "cluster_namespace must not be empty".to_string(),
            ));
        }
        if self.prometheus.base_url.trim().is_empty() {
            return Err(MeasureError::Config(
                "prometheus.base_url must not be empty".to_string(),
            ));
        }
        if self.alert_poll_interval_secs == 0 {
            return Err(MeasureError::Config(
                "alert_poll_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
