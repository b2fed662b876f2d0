//! Time-bracketing of a single operation.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::record::unix_now;

/// Start/stop timestamps (unix seconds) around an operation and its result.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub start: f64,
    pub stop: f64,
    pub result: T,
}

/// Run `operation` and record when it started and stopped.
///
/// With `measure_after` the start timestamp is taken once the operation has
/// returned instead of right before it is invoked. If `minimal_time` is set
/// and less time has passed since the start, the remainder is slept before
/// the stop timestamp is taken. Errors from `operation` are returned as is.
pub async fn run_timed<F, Fut, T, E>(
    operation: F,
    minimal_time: Option<Duration>,
    measure_after: bool,
) -> Result<Timed<T>, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let before = (!measure_after).then(|| (unix_now(), Instant::now()));

    let result = operation().await?;

    let (start, started_at) = before.unwrap_or_else(|| (unix_now(), Instant::now()));

    if let Some(minimal_time) = minimal_time {
        let remaining = minimal_time.saturating_sub(started_at.elapsed());
        if !remaining.is_zero() {
            debug!(
                remaining_secs = remaining.as_secs_f64(),
                "Operation finished early, waiting for minimal time"
            );
            sleep(remaining).await;
        }
    }

    // Wall clock can step backwards; the record must never end before it starts.
    let stop = unix_now().max(start);

    Ok(Timed {
        start,
        stop,
        result,
    })
}
