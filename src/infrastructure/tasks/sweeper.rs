//! Periodic eviction of expired in-memory state

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A structure that accumulates entries and must be pruned periodically
pub trait Sweep: Send + Sync + 'static {
    /// Name used in log records
    fn name(&self) -> &'static str;

    /// Remove stale entries and return how many were removed
    fn sweep(&self) -> usize;
}

/// Run a single sweep, containing any panic it raises.
///
/// Returns `None` when the iteration panicked.
pub fn sweep_once(target: &dyn Sweep) -> Option<usize> {
    match catch_unwind(AssertUnwindSafe(|| target.sweep())) {
        Ok(removed) => {
            if removed > 0 {
                debug!(task = target.name(), removed, "Sweep removed stale entries");
            }
            Some(removed)
        }
        Err(_) => {
            error!(
                task = target.name(),
                "Sweep iteration panicked, retrying on next tick"
            );
            None
        }
    }
}

/// Sweep `target` every `period` until `cancel_token` fires
pub async fn run_sweeper(target: Arc<dyn Sweep>, period: Duration, cancel_token: CancellationToken) {
    info!(
        task = target.name(),
        interval_secs = period.as_secs_f64(),
        "Starting sweeper"
    );

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                sweep_once(target.as_ref());
            }
            _ = cancel_token.cancelled() => {
                info!(task = target.name(), "Sweeper stopped");
                break;
            }
        }
    }
}
