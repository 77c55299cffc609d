use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::application::ingestion::TransactionLog;
use crate::application::query::{AggregationEngine, UtxoPaginator, UtxoService};
use crate::application::snapshot::{SnapshotScheduler, SnapshotWorker};
use crate::config::AppConfig;
use crate::domain::services::{AssetSchemeResolver, StandardAddressResolver};
use crate::infrastructure::ledger::LedgerHead;
use crate::infrastructure::persistence::RepositoryFactory;

/// Wired application services sharing one connection pool
pub struct Services {
    pub transaction_log: Arc<TransactionLog>,
    pub utxo_service: Arc<UtxoService>,
    pub snapshots: Arc<SnapshotScheduler>,
}

impl Services {
    /// Build every service plus the snapshot worker that must be spawned
    /// for requests to be materialized
    pub fn build(
        conn: DatabaseConnection,
        ledger: Arc<dyn LedgerHead>,
        config: &AppConfig,
    ) -> (Self, SnapshotWorker) {
        let repositories = RepositoryFactory::from_connection(conn.clone());
        let schemes: Arc<dyn AssetSchemeResolver> = Arc::new(repositories.asset_scheme.clone());

        let (scheduler, jobs) = SnapshotScheduler::new(
            repositories.snapshot.clone(),
            repositories.utxo.clone(),
            repositories.transaction_log.clone(),
            Arc::clone(&ledger),
        );
        let snapshots = Arc::new(scheduler);
        let worker = SnapshotWorker::new(Arc::clone(&snapshots), jobs, &config.snapshot);

        let utxo_service = UtxoService::new(
            UtxoPaginator::new(repositories.utxo.clone(), config.query.seek_chunk_size),
            AggregationEngine::new(repositories.utxo.clone(), Arc::clone(&schemes)),
            schemes,
            repositories.transaction_log.clone(),
            ledger,
            Arc::clone(&snapshots),
            config.query.clone(),
        );

        let transaction_log =
            TransactionLog::new(conn, repositories, Arc::new(StandardAddressResolver));

        (
            Self {
                transaction_log: Arc::new(transaction_log),
                utxo_service: Arc::new(utxo_service),
                snapshots,
            },
            worker,
        )
    }
}
