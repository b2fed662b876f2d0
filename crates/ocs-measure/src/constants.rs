//! Resource names, label selectors and alert names used across the harness.

use std::time::Duration;

/// Namespace the storage operator deploys Ceph into.
pub const DEFAULT_CLUSTER_NAMESPACE: &str = "openshift-storage";

/// Directory name used when no measurement dir is configured.
pub const MEASUREMENT_RESULTS_DIR: &str = "measurement_results";

// Resources / Kinds
pub const DEPLOYMENT: &str = "Deployment";

// Daemon labels
pub const MON_APP_LABEL: &str = "app=rook-ceph-mon";
pub const MGR_APP_LABEL: &str = "app=rook-ceph-mgr";
pub const OSD_APP_LABEL: &str = "app=rook-ceph-osd";

// Alert state
pub const ALERT_STATE_FIRING: &str = "firing";

// Alerts from ceph-mixins expected during the scenarios
pub const ALERT_MGR_IS_ABSENT: &str = "CephMgrIsAbsent";
pub const ALERT_MON_QUORUM_AT_RISK: &str = "CephMonQuorumAtRisk";
pub const ALERT_OSD_DISK_NOT_RESPONDING: &str = "CephOSDDiskNotResponding";
pub const ALERT_CLUSTER_WARNING_STATE: &str = "CephClusterWarningState";

/// Seconds between two queries of the alerts API.
pub const ALERT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Manager alert is pending for 5 minutes, so 6 minutes sees it fire.
pub const MGR_STOP_RUN_TIME: Duration = Duration::from_secs(60 * 6);

/// Monitors are redeployed by the operator shortly after 10 minutes.
pub const MON_STOP_RUN_TIME: Duration = Duration::from_secs(60 * 12);

/// CephClusterWarningState needs 10 minutes to fire.
pub const OSD_STOP_RUN_TIME: Duration = Duration::from_secs(60 * 11);

// Result slots
pub const SLOT_STOP_CEPH_MGR: &str = "measure_stop_ceph_mgr";
pub const SLOT_STOP_CEPH_MON: &str = "measure_stop_ceph_mon";
pub const SLOT_STOP_CEPH_OSD: &str = "measure_stop_ceph_osd";
