//! Measurement orchestration.
//!
//! `measure_operation` is a read-through cache around one measured run:
//!
//! ```text
//! CheckingCache ──hit──────────────────────────────────────────────► Done
//!       │
//!      miss ─► Running (watcher + operation) ─► Merging ─► Persisted ─► Done
//! ```
//!
//! Any failure while running aborts the measurement and nothing is stored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::constants::ALERT_POLL_INTERVAL;
use crate::error::MeasureError;
use crate::record::MeasurementRecord;
use crate::store::ResultStore;
use crate::timed::run_timed;
use crate::watcher::{AlertSource, AlertWatcher};

/// Phases of a measurement, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CheckingCache,
    Running,
    Merging,
    Persisted,
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckingCache => write!(f, "checking-cache"),
            Self::Running => write!(f, "running"),
            Self::Merging => write!(f, "merging"),
            Self::Persisted => write!(f, "persisted"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Options for a single measurement.
#[derive(Debug, Clone, Default)]
pub struct MeasureOptions {
    /// Keep monitoring at least this long after the start timestamp
    pub minimal_time: Option<Duration>,
    /// Free-form information stored alongside the result
    pub metadata: Option<Map<String, Value>>,
    /// Take the start timestamp after the operation returns
    pub measure_after: bool,
}

impl MeasureOptions {
    pub fn minimal_time(mut self, minimal_time: Duration) -> Self {
        self.minimal_time = Some(minimal_time);
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn measure_after(mut self, measure_after: bool) -> Self {
        self.measure_after = measure_after;
        self
    }
}

/// Runs operations while watching alerts and caches the outcome.
#[derive(Clone)]
pub struct Measurer {
    store: Arc<dyn ResultStore>,
    alerts: Arc<dyn AlertSource>,
    poll_interval: Duration,
}

impl Measurer {
    pub fn new(store: Arc<dyn ResultStore>, alerts: Arc<dyn AlertSource>) -> Self {
        Self {
            store,
            alerts,
            poll_interval: ALERT_POLL_INTERVAL,
        }
    }

    /// Override the delay between two alert queries.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Measure `operation`, or return the record already stored in `slot`.
    ///
    /// On a cache miss the alert watcher runs for the whole duration of the
    /// operation (extended to `minimal_time` if given). The record is stored
    /// only when the operation and the watcher both finished cleanly.
    pub async fn measure_operation<F, Fut, T>(
        &self,
        slot: &str,
        options: MeasureOptions,
        operation: F,
    ) -> Result<MeasurementRecord, MeasureError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MeasureError>>,
        T: Serialize,
    {
        let location = self.store.location(slot);
        debug!(slot = %slot, phase = %Phase::CheckingCache, "Measurement phase");

        if let Some(record) = self.store.load(slot).await? {
            info!(
                location = %location,
                "Result file already created, using it for tests"
            );
            debug!(slot = %slot, phase = %Phase::Done, record = ?record, "Measurement phase");
            return Ok(record);
        }

        info!(
            store = self.store.store_type(),
            location = %location,
            "Result file not created yet, starting measurement"
        );
        debug!(slot = %slot, phase = %Phase::Running, "Measurement phase");

        let watcher = AlertWatcher::start(Arc::clone(&self.alerts), self.poll_interval);
        let timed = run_timed(operation, options.minimal_time, options.measure_after).await;
        watcher.request_stop();
        let watched = watcher.join().await;

        let timed = match timed {
            Ok(timed) => timed,
            Err(e) => {
                if let Err(watch_err) = watched {
                    warn!(error = %watch_err, "Alert watcher also failed");
                }
                return Err(e);
            }
        };
        let alerts = watched?;

        debug!(slot = %slot, phase = %Phase::Merging, "Measurement phase");
        let record = MeasurementRecord {
            start: timed.start,
            stop: timed.stop,
            result: serde_json::to_value(timed.result)?,
            metadata: options.metadata,
            alerts,
        };
        info!(
            start = record.start,
            stop = record.stop,
            result = %record.result,
            alerts = record.alerts.len(),
            "Results of measurement"
        );

        info!(location = %location, "Dumping results of measurement");
        self.store.save(slot, &record).await?;
        debug!(slot = %slot, phase = %Phase::Persisted, "Measurement phase");
        debug!(slot = %slot, phase = %Phase::Done, "Measurement phase");

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::CheckingCache.to_string(), "checking-cache");
        assert_eq!(Phase::Persisted.to_string(), "persisted");
    }

    #[test]
    fn test_options_builder() {
        let options = MeasureOptions::default()
            .minimal_time(Duration::from_secs(5))
            .measure_after(true);
        assert_eq!(options.minimal_time, Some(Duration::from_secs(5)));
        assert!(options.measure_after);
        assert!(options.metadata.is_none());
    }
}
