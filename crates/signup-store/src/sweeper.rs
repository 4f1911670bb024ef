//! Background sweep of abandoned pending registrations.
//!
//! Reads never depend on the sweep having run; it only bounds memory
//! held by signups that were started and never finished.

use crate::store::TempSessionStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shortest interval the sweeper accepts.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically removes expired entries from a [`TempSessionStore`].
pub struct SessionSweeper {
    store: TempSessionStore,
    interval: Duration,
}

impl SessionSweeper {
    /// Intervals below [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn new(store: TempSessionStore, interval: Duration) -> Self {
        let interval = if interval < MIN_SWEEP_INTERVAL {
            warn!(
                "Sweep interval {:?} too short, using {:?}",
                interval, MIN_SWEEP_INTERVAL
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };

        Self { store, interval }
    }

    /// Run a single sweep cycle.
    pub async fn sweep_once(&self) -> usize {
        self.store.sweep_expired().await
    }

    /// Run the sweeper until the task is aborted.
    pub async fn run(&self) {
        info!("Starting pending signup sweeper, interval: {:?}", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            let removed = self.sweep_once().await;
            if removed == 0 {
                debug!("No expired pending registrations this cycle");
            } else {
                info!("Sweep cycle complete: {} expired registrations removed", removed);
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Handle to a running sweeper task.
///
/// Dropping the handle leaves the task running; call [`shutdown`](Self::shutdown).
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the task to wind down.
    pub async fn shutdown(self) {
        self.task.abort();
        // A cancelled JoinError is the expected result here
        let _ = self.task.await;
        info!("Pending signup sweeper stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the sweeper as a background task.
pub fn spawn_sweeper(store: TempSessionStore, interval: Duration) -> SweeperHandle {
    let sweeper = SessionSweeper::new(store, interval);

    let task = tokio::spawn(async move {
        sweeper.run().await;
    });

    SweeperHandle { task }
}
