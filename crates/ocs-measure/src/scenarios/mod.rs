//! Fault-injection scenarios.
//!
//! Each scenario picks daemons by label, scales them to zero for long enough
//! to push the related alert from pending to firing, and measures the alerts
//! seen meanwhile. Deployments disrupted by the run are scaled back up
//! afterwards.

mod mgr;
mod mon;
mod osd;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cluster::ClusterClient;
use crate::constants::{
    ALERT_CLUSTER_WARNING_STATE, ALERT_MGR_IS_ABSENT, ALERT_MON_QUORUM_AT_RISK,
    ALERT_OSD_DISK_NOT_RESPONDING, MGR_APP_LABEL, MGR_STOP_RUN_TIME, MON_APP_LABEL,
    MON_STOP_RUN_TIME, OSD_APP_LABEL, OSD_STOP_RUN_TIME, SLOT_STOP_CEPH_MGR, SLOT_STOP_CEPH_MON,
    SLOT_STOP_CEPH_OSD,
};
use crate::error::{ClusterError, MeasureError};
use crate::measure::Measurer;
use crate::record::MeasurementRecord;

pub use mon::monitors_to_stop;

/// Available scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Stop the Ceph manager
    StopMgr,
    /// Stop a minority of Ceph monitors
    StopMon,
    /// Stop one Ceph OSD
    StopOsd,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Self::StopMgr, Self::StopMon, Self::StopOsd];

    /// Result slot the measurement is cached in.
    pub fn slot(self) -> &'static str {
        match self {
            Self::StopMgr => SLOT_STOP_CEPH_MGR,
            Self::StopMon => SLOT_STOP_CEPH_MON,
            Self::StopOsd => SLOT_STOP_CEPH_OSD,
        }
    }

    /// Label selecting the daemons this scenario disrupts.
    pub fn label_selector(self) -> &'static str {
        match self {
            Self::StopMgr => MGR_APP_LABEL,
            Self::StopMon => MON_APP_LABEL,
            Self::StopOsd => OSD_APP_LABEL,
        }
    }

    /// How long the daemons stay down.
    pub fn default_run_time(self) -> Duration {
        match self {
            Self::StopMgr => MGR_STOP_RUN_TIME,
            Self::StopMon => MON_STOP_RUN_TIME,
            Self::StopOsd => OSD_STOP_RUN_TIME,
        }
    }

    /// Alerts the monitoring stack should raise during the disruption.
    pub fn expected_alerts(self) -> &'static [&'static str] {
        match self {
            Self::StopMgr => &[ALERT_MGR_IS_ABSENT],
            Self::StopMon => &[ALERT_MON_QUORUM_AT_RISK],
            Self::StopOsd => &[ALERT_OSD_DISK_NOT_RESPONDING, ALERT_CLUSTER_WARNING_STATE],
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slot())
    }
}

/// Cluster access plus the measurer shared by all scenarios.
#[derive(Clone)]
pub struct Harness {
    cluster: Arc<dyn ClusterClient>,
    measurer: Measurer,
}

impl Harness {
    pub fn new(cluster: Arc<dyn ClusterClient>, measurer: Measurer) -> Self {
        Self { cluster, measurer }
    }

    /// Run `scenario`, keeping its daemons down for `run_time`
    /// (the scenario default when `None`).
    pub async fn run(
        &self,
        scenario: Scenario,
        run_time: Option<Duration>,
    ) -> Result<MeasurementRecord, MeasureError> {
        let run_time = run_time.unwrap_or_else(|| scenario.default_run_time());
        info!(scenario = %scenario, run_time_secs = run_time.as_secs_f64(), "Running scenario");

        match scenario {
            Scenario::StopMgr => mgr::measure_stop_ceph_mgr(self, run_time).await,
            Scenario::StopMon => mon::measure_stop_ceph_mon(self, run_time).await,
            Scenario::StopOsd => osd::measure_stop_ceph_osd(self, run_time).await,
        }
    }

    async fn list_targets(&self, scenario: Scenario) -> Result<Vec<String>, MeasureError> {
        let names = self.cluster.list_names(scenario.label_selector()).await?;
        if names.is_empty() {
            return Err(MeasureError::NoTargets {
                selector: scenario.label_selector().to_string(),
            });
        }
        Ok(names)
    }
}

/// Set once a scenario has started scaling deployments down.
#[derive(Debug, Clone, Default)]
struct Disrupted(Arc<AtomicBool>);

impl Disrupted {
    fn mark(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Scale every deployment in `names` down to zero.
async fn downscale(cluster: &dyn ClusterClient, names: &[String]) -> Result<(), ClusterError> {
    for name in names {
        info!(deployment = %name, "Downscaling deployment to 0");
        cluster.scale(name, 0).await?;
    }
    Ok(())
}

/// Scale every deployment in `names` back to one replica.
///
/// Tries all of them and reports the first failure.
async fn upscale(cluster: &dyn ClusterClient, names: &[String]) -> Result<(), ClusterError> {
    let mut first_error = None;
    for name in names {
        info!(deployment = %name, "Upscaling deployment back to 1");
        if let Err(e) = cluster.scale(name, 1).await {
            warn!(deployment = %name, error = %e, "Failed to upscale deployment");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Restore `names` after a measurement and decide the scenario outcome.
///
/// A failed measurement keeps its own error; restoration problems are only
/// logged in that case.
async fn restore_after(
    cluster: &dyn ClusterClient,
    names: &[String],
    disrupted: &Disrupted,
    measured: Result<MeasurementRecord, MeasureError>,
) -> Result<MeasurementRecord, MeasureError> {
    if !disrupted.get() {
        return measured;
    }
    let restored = upscale(cluster, names).await;
    match measured {
        Ok(record) => {
            restored?;
            Ok(record)
        }
        Err(e) => {
            if let Err(restore_err) = restored {
                warn!(error = %restore_err, "Restoration after failed measurement incomplete");
            }
            Err(e)
        }
    }
}
