//! Measurement records and the alerts they carry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::ALERT_STATE_FIRING;

/// An alert as returned by the alerts API.
///
/// The payload is kept verbatim; two alerts are equal only when their whole
/// JSON values are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alert(Value);

impl Alert {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Value of the `alertname` label.
    pub fn name(&self) -> Option<&str> {
        self.0.get("labels")?.get("alertname")?.as_str()
    }

    /// Alert state (`pending`, `firing`, ...).
    pub fn state(&self) -> Option<&str> {
        self.0.get("state")?.as_str()
    }

    pub fn is_firing(&self) -> bool {
        self.state() == Some(ALERT_STATE_FIRING)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one measured operation.
///
/// Serialized as a single JSON document; `start` and `stop` are unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub start: f64,
    pub stop: f64,
    pub result: Value,
    pub metadata: Option<Map<String, Value>>,
    #[serde(rename = "prometheus_alerts")]
    pub alerts: Vec<Alert>,
}

impl MeasurementRecord {
    /// Seconds between `start` and `stop`.
    pub fn duration_secs(&self) -> f64 {
        self.stop - self.start
    }

    /// All recorded alerts carrying the given `alertname`.
    pub fn alerts_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Alert> + 'a {
        self.alerts.iter().filter(move |a| a.name() == Some(name))
    }
}

/// Current wall-clock time as fractional unix seconds.
pub fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
