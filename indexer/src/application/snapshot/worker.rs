//! Background materialization of snapshot requests

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::scheduler::SnapshotScheduler;
use crate::config::SnapshotConfig;
use crate::utils::logging;

/// Consumes newly created snapshot ids and periodically sweeps the requests
/// still waiting for their target block
pub struct SnapshotWorker {
    scheduler: Arc<SnapshotScheduler>,
    receiver: mpsc::UnboundedReceiver<String>,
    sweep_interval: Duration,
}

impl SnapshotWorker {
    pub fn new(
        scheduler: Arc<SnapshotScheduler>,
        receiver: mpsc::UnboundedReceiver<String>,
        config: &SnapshotConfig,
    ) -> Self {
        Self {
            scheduler,
            receiver,
            sweep_interval: Duration::from_millis(config.sweep_interval_ms.max(1)),
        }
    }

    /// Run until the job channel closes
    pub async fn start(mut self) {
        let mut sweep_timer = interval(self.sweep_interval);
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        logging::log_info(&format!(
            "[SNAPSHOT_WORKER] Starting (sweep every {:?})",
            self.sweep_interval
        ));

        loop {
            tokio::select! {
                job = self.receiver.recv() => {
                    match job {
                        Some(id) => self.spawn_resolve(id),
                        None => {
                            logging::log_info("[SNAPSHOT_WORKER] Channel closed, shutting down");
                            break;
                        }
                    }
                }

                _ = sweep_timer.tick() => {
                    match self.scheduler.resolve_pending().await {
                        Ok(0) => {}
                        Ok(ready) => logging::log_info(&format!(
                            "[SNAPSHOT_WORKER] Sweep made {} snapshots ready",
                            ready
                        )),
                        Err(e) => logging::log_warning(&format!(
                            "[SNAPSHOT_WORKER] Sweep failed: {}",
                            e
                        )),
                    }
                }
            }
        }
    }

    fn spawn_resolve(&self, id: String) {
        let scheduler = Arc::clone(&self.scheduler);
        tokio::spawn(async move {
            if let Err(e) = scheduler.resolve(&id).await {
                logging::log_warning(&format!(
                    "[SNAPSHOT_WORKER] Snapshot {} left pending: {}",
                    id, e
                ));
            }
        });
    }
}
