//! Background task lifecycle
//!
//! Every periodic task is started through [`BackgroundTasks`], which owns a
//! single cancellation token and the join handles. Shutting it down stops all
//! tasks and waits for them to exit.

mod sweeper;

pub use sweeper::{Sweep, run_sweeper, sweep_once};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owner of the process's background tasks
#[derive(Debug)]
pub struct BackgroundTasks {
    cancel_token: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Token cancelled on shutdown
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start sweeping `target` every `period`
    pub fn spawn_sweeper(&mut self, target: Arc<dyn Sweep>, period: Duration) {
        let name = target.name();
        let handle = tokio::spawn(run_sweeper(target, period, self.cancel_token.clone()));
        self.handles.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel every task and wait for all of them to finish
    pub async fn shutdown(self) {
        self.cancel_token.cancel();

        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                warn!(task = name, error = %e, "Background task ended abnormally");
            }
        }

        info!("Background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
