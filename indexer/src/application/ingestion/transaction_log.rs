//! Ingestion of ledger transactions into the log and the UTXO index

use std::collections::BTreeSet;
use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use super::retry_handler::RetryHandler;
use crate::domain::errors::{IndexerError, IndexerResult};
use crate::domain::models::identifiers::{is_hex, parse_asset_type, strip_0x};
use crate::domain::models::{LedgerTransaction, LogEntry, TransactionAction};
use crate::domain::services::AddressResolver;
use crate::infrastructure::persistence::entities::transaction_logs;
use crate::infrastructure::persistence::repositories::transaction_log_repository::{
    ADDRESS_KIND_INPUT, ADDRESS_KIND_OWNER,
};
use crate::infrastructure::persistence::repositories::{
    Repositories, SpentOutPoint, TransactionLogRepository, UtxoInsert,
};
use crate::utils::logging;

/// Records ledger transactions and keeps every derived index in step.
///
/// Each call is one database transaction covering the log row, the UTXO rows,
/// both activity logs and the asset scheme. Unique-key collisions with a
/// concurrent writer re-run the whole unit.
pub struct TransactionLog {
    db: DatabaseConnection,
    repositories: Repositories,
    address_resolver: Arc<dyn AddressResolver>,
    retry_handler: RetryHandler,
}

impl TransactionLog {
    pub fn new(
        db: DatabaseConnection,
        repositories: Repositories,
        address_resolver: Arc<dyn AddressResolver>,
    ) -> Self {
        Self {
            db,
            repositories,
            address_resolver,
            retry_handler: RetryHandler::new(),
        }
    }

    pub fn with_retry_handler(mut self, retry_handler: RetryHandler) -> Self {
        self.retry_handler = retry_handler;
        self
    }

    /// Record a transaction seen on the ledger, pending or confirmed.
    ///
    /// Idempotent on the transaction hash: a confirmed row is never touched
    /// again, and a pending row is finalized when the incoming copy carries a
    /// block position.
    pub async fn record_transaction(
        &self,
        tx: &LedgerTransaction,
        asset_type: Option<&str>,
    ) -> IndexerResult<LogEntry> {
        tx.validate()?;
        let asset_type = match asset_type {
            Some(asset_type) => Some(parse_asset_type(asset_type)?),
            None => tx.primary_asset_type(),
        };

        let entry = self
            .retry_handler
            .execute_with_retry(
                || self.record_once(tx, asset_type.clone()),
                "record_transaction",
                IndexerError::is_retryable,
            )
            .await?;

        Ok(TransactionLogRepository::to_domain_model(entry))
    }

    /// Move a recorded pending transaction to its block position.
    /// Finalizing an already confirmed transaction changes nothing.
    pub async fn finalize_transaction(
        &self,
        transaction_hash: &str,
        block_number: i64,
        transaction_index: i32,
    ) -> IndexerResult<()> {
        if !is_hex(&strip_0x(transaction_hash)) {
            return Err(IndexerError::validation(format!(
                "invalid transaction hash: {}",
                transaction_hash
            )));
        }
        if block_number < 0 || transaction_index < 0 {
            return Err(IndexerError::validation(format!(
                "invalid block position {}/{}",
                block_number, transaction_index
            )));
        }

        self.retry_handler
            .execute_with_retry(
                || self.finalize_once(transaction_hash, block_number, transaction_index),
                "finalize_transaction",
                IndexerError::is_retryable,
            )
            .await?;

        Ok(())
    }

    /// Look up a recorded transaction
    pub async fn get(&self, transaction_hash: &str) -> IndexerResult<Option<LogEntry>> {
        Ok(self.repositories.transaction_log.get(transaction_hash).await?)
    }

    async fn record_once(
        &self,
        tx: &LedgerTransaction,
        asset_type: Option<String>,
    ) -> IndexerResult<transaction_logs::Model> {
        let txn = self.db.begin().await?;

        let entry = match self
            .repositories
            .transaction_log
            .find_in(&txn, &tx.hash)
            .await?
        {
            None => self.apply_new(&txn, tx, asset_type).await?,
            Some(existing) if !existing.is_pending => existing,
            Some(existing) => match tx.position() {
                Some((block_number, transaction_index)) => {
                    self.apply_confirmation(
                        &txn,
                        &existing.transaction_hash,
                        block_number,
                        transaction_index,
                    )
                    .await?
                }
                None => existing,
            },
        };

        txn.commit().await?;
        Ok(entry)
    }

    async fn finalize_once(
        &self,
        transaction_hash: &str,
        block_number: i64,
        transaction_index: i32,
    ) -> IndexerResult<()> {
        let txn = self.db.begin().await?;

        match self
            .repositories
            .transaction_log
            .find_in(&txn, transaction_hash)
            .await?
        {
            None => {
                return Err(IndexerError::Conflict(format!(
                    "cannot finalize unknown transaction {}",
                    transaction_hash
                )))
            }
            Some(existing) if !existing.is_pending => {
                logging::log_debug(&format!(
                    "Transaction {} already confirmed at block {:?}",
                    existing.transaction_hash, existing.block_number
                ));
            }
            Some(existing) => {
                self.apply_confirmation(
                    &txn,
                    &existing.transaction_hash,
                    block_number,
                    transaction_index,
                )
                .await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }

    async fn apply_new(
        &self,
        txn: &DatabaseTransaction,
        tx: &LedgerTransaction,
        asset_type: Option<String>,
    ) -> IndexerResult<transaction_logs::Model> {
        let repos = &self.repositories;
        let hash = strip_0x(&tx.hash);

        let entry = repos.transaction_log.insert(txn, tx, asset_type).await?;

        let outpoints: Vec<SpentOutPoint> = tx
            .spent_outpoints()
            .iter()
            .map(|prev_out| SpentOutPoint {
                tracker: strip_0x(&prev_out.tracker),
                output_index: prev_out.index as i32,
            })
            .collect();
        let consumed = repos
            .utxo
            .mark_spent(txn, &outpoints, &hash, tx.block_number)
            .await?;
        if consumed.len() < outpoints.len() {
            logging::log_debug(&format!(
                "Transaction {} spends {} outputs not present in the index",
                hash,
                outpoints.len() - consumed.len()
            ));
        }

        let outputs: Vec<UtxoInsert> = tx
            .created_outputs()
            .into_iter()
            .map(|output| UtxoInsert {
                transaction_hash: hash.clone(),
                output_index: output.output_index,
                tracker: strip_0x(&tx.tracker),
                owner: self.address_resolver.get_owner(
                    output.lock_script_hash,
                    output.parameters,
                    &tx.network_id,
                ),
                asset_type: strip_0x(output.asset_type),
                shard_id: i32::from(output.shard_id),
                lock_script_hash: strip_0x(output.lock_script_hash),
                parameters: output.parameters.iter().map(|p| strip_0x(p)).collect(),
                quantity: output.quantity,
                block_number: tx.block_number,
                transaction_index: tx.transaction_index,
            })
            .collect();

        let mut addresses: BTreeSet<(String, &'static str)> = BTreeSet::new();
        for output in &outputs {
            if let Some(owner) = &output.owner {
                addresses.insert((owner.clone(), ADDRESS_KIND_OWNER));
            }
        }
        for utxo in &consumed {
            if let Some(owner) = &utxo.owner {
                addresses.insert((owner.clone(), ADDRESS_KIND_INPUT));
            }
        }

        let created = repos.utxo.insert_outputs(txn, outputs).await?;
        repos
            .transaction_log
            .insert_address_logs(txn, tx, &addresses)
            .await?;
        repos
            .transaction_log
            .insert_asset_type_logs(txn, tx, &tx.asset_types())
            .await?;

        match &tx.action {
            TransactionAction::MintAsset(mint) => {
                repos.asset_scheme.insert_mint(txn, tx, mint).await?;
            }
            TransactionAction::IncreaseAssetSupply(increase) => {
                repos
                    .asset_scheme
                    .increase_supply(txn, &increase.asset_type, increase.output.supply)
                    .await?;
            }
            TransactionAction::TransferAsset(_) => {}
        }

        logging::log_debug(&format!(
            "Recorded {} {} ({}): {} outputs created, {} spent",
            tx.type_tag(),
            hash,
            if tx.is_pending() { "pending" } else { "confirmed" },
            created,
            consumed.len()
        ));

        Ok(entry)
    }

    async fn apply_confirmation(
        &self,
        txn: &DatabaseTransaction,
        transaction_hash: &str,
        block_number: i64,
        transaction_index: i32,
    ) -> IndexerResult<transaction_logs::Model> {
        let repos = &self.repositories;

        repos
            .transaction_log
            .confirm(txn, transaction_hash, block_number, transaction_index)
            .await?;
        repos
            .utxo
            .confirm_outputs(txn, transaction_hash, block_number, transaction_index)
            .await?;
        repos
            .utxo
            .confirm_spends(txn, transaction_hash, block_number)
            .await?;
        repos
            .transaction_log
            .confirm_activity(txn, transaction_hash, block_number, transaction_index)
            .await?;
        repos.asset_scheme.confirm(txn, transaction_hash).await?;

        logging::log_debug(&format!(
            "Finalized {} at block {} index {}",
            transaction_hash, block_number, transaction_index
        ));

        repos
            .transaction_log
            .find_in(txn, transaction_hash)
            .await?
            .ok_or_else(|| {
                IndexerError::Conflict(format!("transaction {} vanished", transaction_hash))
            })
    }
}
