//! Stop one Ceph OSD.
//!
//! CephOSDDiskNotResponding fires after 1 minute and CephClusterWarningState
//! after 10, so the last OSD in listing order is kept down for 11 minutes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use super::{downscale, restore_after, Disrupted, Harness, Scenario};
use crate::error::MeasureError;
use crate::measure::MeasureOptions;
use crate::record::MeasurementRecord;

pub(super) async fn measure_stop_ceph_osd(
    harness: &Harness,
    run_time: Duration,
) -> Result<MeasurementRecord, MeasureError> {
    let mut osds = harness.list_targets(Scenario::StopOsd).await?;
    let to_stop = osds.split_off(osds.len() - 1);
    info!(osd = ?to_stop, "OSD disks to stop");
    info!(osds = ?osds, "OSD disks left to run");

    let disrupted = Disrupted::default();
    let cluster = Arc::clone(&harness.cluster);
    let flag = disrupted.clone();
    let targets = to_stop.clone();

    let stop_osd = move || async move {
        flag.mark();
        downscale(cluster.as_ref(), &targets).await?;
        info!(seconds = run_time.as_secs_f64(), "Waiting");
        sleep(run_time).await;
        Ok::<_, MeasureError>(targets[0].clone())
    };

    let measured = harness
        .measurer
        .measure_operation(Scenario::StopOsd.slot(), MeasureOptions::default(), stop_osd)
        .await;

    restore_after(harness.cluster.as_ref(), &to_stop, &disrupted, measured).await
}
