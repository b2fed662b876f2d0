//! Stop the Ceph manager.
//!
//! CephMgrIsAbsent stays pending for 5 minutes before firing, so the manager
//! is kept down for 6.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use super::{downscale, restore_after, Disrupted, Harness, Scenario};
use crate::error::MeasureError;
use crate::measure::MeasureOptions;
use crate::record::MeasurementRecord;

pub(super) async fn measure_stop_ceph_mgr(
    harness: &Harness,
    run_time: Duration,
) -> Result<MeasurementRecord, MeasureError> {
    let mgrs = harness.list_targets(Scenario::StopMgr).await?;
    let to_stop = vec![mgrs[0].clone()];

    let disrupted = Disrupted::default();
    let cluster = Arc::clone(&harness.cluster);
    let flag = disrupted.clone();
    let targets = to_stop.clone();

    let stop_mgr = move || async move {
        flag.mark();
        downscale(cluster.as_ref(), &targets).await?;
        info!(seconds = run_time.as_secs_f64(), "Waiting");
        sleep(run_time).await;
        Ok::<_, MeasureError>(targets[0].clone())
    };

    let measured = harness
        .measurer
        .measure_operation(Scenario::StopMgr.slot(), MeasureOptions::default(), stop_mgr)
        .await;

    restore_after(harness.cluster.as_ref(), &to_stop, &disrupted, measured).await
}
