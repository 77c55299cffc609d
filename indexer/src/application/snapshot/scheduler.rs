//! Snapshot requests: validation, deduplication and resolution

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;

use crate::domain::errors::{IndexerError, IndexerResult};
use crate::domain::models::identifiers::parse_asset_type;
use crate::domain::models::snapshot::{parse_target_date, snapshot_id};
use crate::domain::models::{SnapshotRequest, SnapshotResponse, SnapshotStatus};
use crate::infrastructure::ledger::LedgerHead;
use crate::infrastructure::persistence::repositories::{
    SnapshotRepository, TransactionLogRepository, UtxoRepository,
};
use crate::utils::logging;

/// Accepts snapshot requests and turns them into stored UTXO sets once the
/// ledger has produced the target block and the index has caught up to it.
///
/// Newly created requests are announced on a channel consumed by
/// [`super::SnapshotWorker`]; repeated requests for the same asset type and
/// time share one id and one job.
pub struct SnapshotScheduler {
    snapshot_repository: SnapshotRepository,
    utxo_repository: UtxoRepository,
    transaction_log_repository: TransactionLogRepository,
    ledger: Arc<dyn LedgerHead>,
    jobs: mpsc::UnboundedSender<String>,
}

impl SnapshotScheduler {
    /// Create a scheduler and the receiving end of its job channel
    pub fn new(
        snapshot_repository: SnapshotRepository,
        utxo_repository: UtxoRepository,
        transaction_log_repository: TransactionLogRepository,
        ledger: Arc<dyn LedgerHead>,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (jobs, receiver) = mpsc::unbounded_channel();
        (
            Self {
                snapshot_repository,
                utxo_repository,
                transaction_log_repository,
                ledger,
                jobs,
            },
            receiver,
        )
    }

    /// Register a snapshot of `asset_type` as of `target_date` and return its id
    pub async fn request_snapshot(&self, asset_type: &str, target_date: &str) -> IndexerResult<String> {
        let asset_type = parse_asset_type(asset_type)?;
        let target_timestamp = parse_target_date(target_date)?;

        let best_block_number = self.ledger.get_best_block_number().await?;
        let head_timestamp = self.ledger.get_block_timestamp(best_block_number).await?;
        if target_timestamp > head_timestamp {
            return Err(IndexerError::validation(format!(
                "target date {} is after the latest block (timestamp {})",
                target_date, head_timestamp
            )));
        }

        let id = snapshot_id(&asset_type, target_timestamp);
        let created = self
            .snapshot_repository
            .insert_if_absent(&id, &asset_type, target_timestamp)
            .await?;

        if created {
            logging::log_info(&format!("Snapshot {} requested", id));
            self.enqueue(&id);
        } else if self.snapshot_repository.reset_failed(&id).await? {
            logging::log_info(&format!("Snapshot {} requested again after failure", id));
            self.enqueue(&id);
        }

        Ok(id)
    }

    fn enqueue(&self, id: &str) {
        if self.jobs.send(id.to_string()).is_err() {
            logging::log_warning(&format!(
                "Snapshot worker is not running, {} waits for the next sweep",
                id
            ));
        }
    }

    /// Status of a request, with its outputs once ready
    pub async fn get_snapshot(&self, id: &str) -> IndexerResult<SnapshotResponse> {
        self.snapshot_repository
            .get(id)
            .await?
            .ok_or_else(|| IndexerError::NotFound(format!("snapshot {}", id)))
    }

    pub async fn list_requests(&self) -> IndexerResult<Vec<SnapshotRequest>> {
        Ok(self.snapshot_repository.list_all().await?)
    }

    /// Try to materialize one request.
    ///
    /// The request stays pending while the ledger has not produced the
    /// target block, while the index has not recorded a confirmed
    /// transaction at or past it, and on transient ledger errors. A storage
    /// error is returned to the caller. A malformed ledger response fails
    /// the request; requesting it again puts it back in the queue.
    pub async fn resolve(&self, id: &str) -> IndexerResult<SnapshotStatus> {
        let request = self.get_snapshot(id).await?.request;
        if request.status != SnapshotStatus::Pending {
            return Ok(request.status);
        }

        let block_number = match self
            .ledger
            .find_block_at_or_after(request.target_timestamp)
            .await
        {
            Ok(Some(block_number)) => block_number,
            Ok(None) => {
                logging::log_debug(&format!("Snapshot {} target block not produced yet", id));
                return Ok(SnapshotStatus::Pending);
            }
            Err(e) if e.is_transient() => {
                logging::log_warning(&format!("Snapshot {} left pending: {}", id, e));
                return Ok(SnapshotStatus::Pending);
            }
            Err(e) => {
                logging::log_error(&format!("Snapshot {} failed: {}", id, e));
                self.snapshot_repository.mark_failed(id).await?;
                return Ok(SnapshotStatus::Failed);
            }
        };

        let indexed_height = self.transaction_log_repository.indexed_height().await?;
        if indexed_height.map_or(true, |height| height < block_number) {
            logging::log_debug(&format!(
                "Snapshot {} waits for the index to reach block {} (at {:?})",
                id, block_number, indexed_height
            ));
            return Ok(SnapshotStatus::Pending);
        }

        let utxos = self
            .utxo_repository
            .list_live_at(&request.asset_type, block_number)
            .await?;
        let count = utxos.len();

        if self
            .snapshot_repository
            .mark_ready(id, block_number, &utxos)
            .await?
        {
            logging::log_info(&format!(
                "Snapshot {} ready at block {} with {} outputs",
                id, block_number, count
            ));
            Ok(SnapshotStatus::Ready)
        } else {
            Ok(self.get_snapshot(id).await?.request.status)
        }
    }

    /// Resolve every pending request concurrently. Returns how many became
    /// ready; individual errors are logged and leave the request pending.
    pub async fn resolve_pending(&self) -> IndexerResult<usize> {
        let pending = self.snapshot_repository.list_pending().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let results = join_all(pending.iter().map(|request| self.resolve(&request.snapshot_id))).await;

        let mut ready = 0;
        for (request, result) in pending.iter().zip(results) {
            match result {
                Ok(SnapshotStatus::Ready) => ready += 1,
                Ok(_) => {}
                Err(e) => logging::log_warning(&format!(
                    "Snapshot {} left pending: {}",
                    request.snapshot_id, e
                )),
            }
        }

        Ok(ready)
    }
}
