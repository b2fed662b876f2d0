//! Background polling of the alerts API.
//!
//! The watcher runs as its own tokio task next to the measured operation.
//! Ownership is split the same way for every run:
//! - the orchestrator owns the [`WatcherHandle`] flag and is the only writer
//! - the task owns the [`AlertLog`] and hands it back through [`AlertWatcher::join`]
//!
//! The flag is checked at the top of each iteration, so a stop request lets
//! the current query and sleep finish before the task exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

use crate::error::MeasureError;
use crate::record::Alert;

/// Something that lists the alerts currently known to the monitoring stack.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Alerts that are neither silenced nor inhibited.
    async fn active_alerts(&self) -> Result<Vec<Alert>, MeasureError>;
}

/// Run flag shared between the orchestrator and the watcher task.
#[derive(Debug, Clone)]
pub struct WatcherHandle {
    running: Arc<AtomicBool>,
}

impl WatcherHandle {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the watcher to exit after its current iteration.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for WatcherHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Alerts in first-seen order, without structural duplicates.
#[derive(Debug, Default, Clone)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    /// Append `alert` unless an equal one is already logged.
    /// Returns whether it was added.
    pub fn record(&mut self, alert: Alert) -> bool {
        if self.alerts.contains(&alert) {
            return false;
        }
        self.alerts.push(alert);
        true
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn into_alerts(self) -> Vec<Alert> {
        self.alerts
    }
}

/// A running alert polling task.
pub struct AlertWatcher {
    handle: WatcherHandle,
    task: JoinHandle<Result<Vec<Alert>, MeasureError>>,
}

impl AlertWatcher {
    /// Spawn the polling loop and return immediately.
    pub fn start(source: Arc<dyn AlertSource>, interval: Duration) -> Self {
        let handle = WatcherHandle::new();
        let task = tokio::spawn(poll_alerts(source, handle.clone(), interval));
        Self { handle, task }
    }

    pub fn request_stop(&self) {
        self.handle.request_stop();
    }

    /// Wait for the loop to exit and collect the alert log.
    ///
    /// Returns the first query failure if the loop stopped on one.
    pub async fn join(mut self) -> Result<Vec<Alert>, MeasureError> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(MeasureError::WatcherAborted(e.to_string())),
        }
    }
}

impl Drop for AlertWatcher {
    // A measurement dropped mid-run must not leave the poller behind.
    fn drop(&mut self) {
        self.handle.request_stop();
        self.task.abort();
    }
}

async fn poll_alerts(
    source: Arc<dyn AlertSource>,
    handle: WatcherHandle,
    interval: Duration,
) -> Result<Vec<Alert>, MeasureError> {
    let mut log = AlertLog::default();
    info!("Logging of all prometheus alerts started");

    while handle.is_running() {
        let alerts = match source.active_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                error!(error = %e, "Alert query failed, stopping alert logging");
                return Err(e);
            }
        };
        for alert in alerts {
            let shown = alert.to_string();
            if log.record(alert) {
                info!(alert = %shown, "Adding alert to alert list");
            }
        }
        sleep(interval).await;
    }

    info!(count = log.len(), "Logging of all prometheus alerts stopped");
    Ok(log.into_alerts())
}
