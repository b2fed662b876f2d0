//! Stop a minority of Ceph monitors.
//!
//! CephMonQuorumAtRisk is pending for 15 minutes. The operator should
//! redeploy the stopped monitors under new names shortly after 10 minutes,
//! so the alert is not expected to fire within the 12 minute window.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use super::{downscale, restore_after, upscale, Disrupted, Harness, Scenario};
use crate::error::MeasureError;
use crate::measure::MeasureOptions;
use crate::record::MeasurementRecord;

/// Monitors to stop: everything after the split index, where the index is
/// half the monitor count for more than three monitors and 2 otherwise.
pub fn monitors_to_stop(mons: &[String]) -> &[String] {
    let split_index = if mons.len() > 3 { mons.len() / 2 } else { 2 };
    mons.get(split_index..).unwrap_or_default()
}

pub(super) async fn measure_stop_ceph_mon(
    harness: &Harness,
    run_time: Duration,
) -> Result<MeasurementRecord, MeasureError> {
    let mons = harness.list_targets(Scenario::StopMon).await?;
    let to_stop = monitors_to_stop(&mons).to_vec();
    info!(monitors = ?to_stop, "Monitors to stop");
    info!(
        monitors = ?&mons[..mons.len() - to_stop.len()],
        "Monitors left to run"
    );

    let disrupted = Disrupted::default();
    let cluster = Arc::clone(&harness.cluster);
    let flag = disrupted.clone();
    let targets = to_stop.clone();

    let stop_mon = move || async move {
        flag.mark();
        downscale(cluster.as_ref(), &targets).await?;
        info!(seconds = run_time.as_secs_f64(), "Waiting");
        sleep(run_time).await;
        Ok::<_, MeasureError>(targets)
    };

    let measured = harness
        .measurer
        .measure_operation(Scenario::StopMon.slot(), MeasureOptions::default(), stop_mon)
        .await;

    if !disrupted.get() || measured.is_err() {
        return restore_after(harness.cluster.as_ref(), &to_stop, &disrupted, measured).await;
    }

    // The operator replaces downscaled monitors with new deployments.
    let current = match harness
        .cluster
        .list_names(Scenario::StopMon.label_selector())
        .await
    {
        Ok(current) => current,
        Err(e) => {
            if let Err(restore_err) = upscale(harness.cluster.as_ref(), &to_stop).await {
                warn!(error = %restore_err, "Restoration of downscaled monitors incomplete");
            }
            return Err(e.into());
        }
    };
    let replaced = to_stop.iter().all(|mon| !current.contains(mon));
    if !replaced {
        if let Err(e) = upscale(harness.cluster.as_ref(), &to_stop).await {
            warn!(error = %e, "Restoration of downscaled monitors incomplete");
        }
        return Err(MeasureError::Postcondition { stopped: to_stop });
    }

    info!(monitors = ?current, "Downscaled monitors were replaced");
    measured
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mons(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("rook-ceph-mon-{}", (b'a' + i as u8) as char)).collect()
    }

    #[test]
    fn test_monitors_to_stop_boundaries() {
        let cases = [(1, 0), (2, 0), (3, 1), (4, 2), (5, 3), (6, 3), (7, 4)];
        for (total, stopped) in cases {
            let all = mons(total);
            assert_eq!(
                monitors_to_stop(&all).len(),
                stopped,
                "Failed for {total} monitors"
            );
        }
    }

    #[test]
    fn test_monitors_to_stop_takes_tail() {
        let all = mons(5);
        assert_eq!(
            monitors_to_stop(&all),
            &["rook-ceph-mon-c", "rook-ceph-mon-d", "rook-ceph-mon-e"]
        );
    }
}
