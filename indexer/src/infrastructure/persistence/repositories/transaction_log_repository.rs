use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::models::identifiers::strip_0x;
use crate::domain::models::{AddressActivity, LedgerTransaction, LogEntry};
use crate::infrastructure::persistence::entities::{address_logs, asset_type_logs, transaction_logs};
use crate::infrastructure::persistence::error::DbError;

/// Address activity kind for recipients of created outputs
pub const ADDRESS_KIND_OWNER: &str = "AssetOwner";
/// Address activity kind for owners of consumed outputs
pub const ADDRESS_KIND_INPUT: &str = "Input";

#[derive(Debug, FromQueryResult)]
struct IndexedHeight {
    height: Option<i64>,
}

/// Repository for the transaction log and its activity logs.
///
/// Write methods take the connection to run on so that ingestion can pass
/// its open database transaction.
#[derive(Clone, Debug)]
pub struct TransactionLogRepository {
    conn: DatabaseConnection,
}

impl TransactionLogRepository {
    /// Create a new TransactionLogRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get a logged transaction by hash
    pub async fn get(&self, transaction_hash: &str) -> Result<Option<LogEntry>, DbError> {
        Ok(self
            .find_in(&self.conn, transaction_hash)
            .await?
            .map(Self::to_domain_model))
    }

    /// Find the raw log row on the given connection
    pub async fn find_in<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_hash: &str,
    ) -> Result<Option<transaction_logs::Model>, DbError> {
        transaction_logs::Entity::find_by_id(strip_0x(transaction_hash))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Highest block holding a confirmed logged transaction, `None` before
    /// the first confirmation
    pub async fn indexed_height(&self) -> Result<Option<i64>, DbError> {
        let height = transaction_logs::Entity::find()
            .select_only()
            .column_as(transaction_logs::Column::BlockNumber.max(), "height")
            .filter(transaction_logs::Column::IsPending.eq(false))
            .into_model::<IndexedHeight>()
            .one(&self.conn)
            .await?;

        Ok(height.and_then(|row| row.height))
    }

    /// Insert the log row of a first-seen transaction
    pub async fn insert<C: ConnectionTrait>(
        &self,
        db: &C,
        tx: &LedgerTransaction,
        asset_type: Option<String>,
    ) -> Result<transaction_logs::Model, DbError> {
        let now = Utc::now();
        let model = transaction_logs::Model {
            transaction_hash: strip_0x(&tx.hash),
            tracker: strip_0x(&tx.tracker),
            transaction_type: tx.type_tag().to_string(),
            block_number: tx.block_number,
            transaction_index: tx.transaction_index,
            is_pending: tx.is_pending(),
            asset_type,
            created_at: now,
            updated_at: now,
        };

        let active = transaction_logs::ActiveModel {
            transaction_hash: Set(model.transaction_hash.clone()),
            tracker: Set(model.tracker.clone()),
            transaction_type: Set(model.transaction_type.clone()),
            block_number: Set(model.block_number),
            transaction_index: Set(model.transaction_index),
            is_pending: Set(model.is_pending),
            asset_type: Set(model.asset_type.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        transaction_logs::Entity::insert(active).exec(db).await?;

        Ok(model)
    }

    /// Move a pending row to its block position. Returns rows changed.
    pub async fn confirm<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_hash: &str,
        block_number: i64,
        transaction_index: i32,
    ) -> Result<u64, DbError> {
        let result = transaction_logs::Entity::update_many()
            .col_expr(transaction_logs::Column::BlockNumber, Expr::value(Some(block_number)))
            .col_expr(
                transaction_logs::Column::TransactionIndex,
                Expr::value(Some(transaction_index)),
            )
            .col_expr(transaction_logs::Column::IsPending, Expr::value(false))
            .col_expr(transaction_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(transaction_logs::Column::TransactionHash.eq(strip_0x(transaction_hash)))
            .filter(transaction_logs::Column::IsPending.eq(true))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Append address activity rows, one per (address, kind)
    pub async fn insert_address_logs<C: ConnectionTrait>(
        &self,
        db: &C,
        tx: &LedgerTransaction,
        entries: &BTreeSet<(String, &'static str)>,
    ) -> Result<usize, DbError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let models: Vec<address_logs::ActiveModel> = entries
            .iter()
            .map(|(address, kind)| address_logs::ActiveModel {
                transaction_hash: Set(strip_0x(&tx.hash)),
                address: Set(address.clone()),
                kind: Set(kind.to_string()),
                tracker: Set(strip_0x(&tx.tracker)),
                transaction_type: Set(tx.type_tag().to_string()),
                block_number: Set(tx.block_number),
                transaction_index: Set(tx.transaction_index),
                is_pending: Set(tx.is_pending()),
            })
            .collect();

        address_logs::Entity::insert_many(models).exec(db).await?;
        Ok(entries.len())
    }

    /// Append asset-type activity rows, one per asset type
    pub async fn insert_asset_type_logs<C: ConnectionTrait>(
        &self,
        db: &C,
        tx: &LedgerTransaction,
        asset_types: &BTreeSet<String>,
    ) -> Result<usize, DbError> {
        if asset_types.is_empty() {
            return Ok(0);
        }

        let models: Vec<asset_type_logs::ActiveModel> = asset_types
            .iter()
            .map(|asset_type| asset_type_logs::ActiveModel {
                transaction_hash: Set(strip_0x(&tx.hash)),
                asset_type: Set(asset_type.clone()),
                tracker: Set(strip_0x(&tx.tracker)),
                transaction_type: Set(tx.type_tag().to_string()),
                block_number: Set(tx.block_number),
                transaction_index: Set(tx.transaction_index),
                is_pending: Set(tx.is_pending()),
            })
            .collect();

        asset_type_logs::Entity::insert_many(models).exec(db).await?;
        Ok(asset_types.len())
    }

    /// Move both activity logs of a transaction to its block position
    pub async fn confirm_activity<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_hash: &str,
        block_number: i64,
        transaction_index: i32,
    ) -> Result<(), DbError> {
        let hash = strip_0x(transaction_hash);

        address_logs::Entity::update_many()
            .col_expr(address_logs::Column::BlockNumber, Expr::value(Some(block_number)))
            .col_expr(
                address_logs::Column::TransactionIndex,
                Expr::value(Some(transaction_index)),
            )
            .col_expr(address_logs::Column::IsPending, Expr::value(false))
            .filter(address_logs::Column::TransactionHash.eq(hash.as_str()))
            .exec(db)
            .await?;

        asset_type_logs::Entity::update_many()
            .col_expr(asset_type_logs::Column::BlockNumber, Expr::value(Some(block_number)))
            .col_expr(
                asset_type_logs::Column::TransactionIndex,
                Expr::value(Some(transaction_index)),
            )
            .col_expr(asset_type_logs::Column::IsPending, Expr::value(false))
            .filter(asset_type_logs::Column::TransactionHash.eq(hash.as_str()))
            .exec(db)
            .await?;

        Ok(())
    }

    /// A page of an address's activity, newest first with pending rows leading
    pub async fn find_address_logs(
        &self,
        address: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AddressActivity>, DbError> {
        let rows = address_logs::Entity::find()
            .filter(address_logs::Column::Address.eq(address))
            .order_by_desc(address_logs::Column::IsPending)
            .order_by_desc(address_logs::Column::BlockNumber)
            .order_by_desc(address_logs::Column::TransactionIndex)
            .order_by_desc(address_logs::Column::TransactionHash)
            .order_by_asc(address_logs::Column::Kind)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| AddressActivity {
                kind: row.kind,
                entry: LogEntry {
                    transaction_hash: row.transaction_hash,
                    tracker: row.tracker,
                    transaction_type: row.transaction_type,
                    block_number: row.block_number,
                    transaction_index: row.transaction_index,
                    is_pending: row.is_pending,
                    asset_type: None,
                },
            })
            .collect())
    }

    /// A page of the transactions touching an asset type, newest first with
    /// pending rows leading
    pub async fn find_asset_type_logs(
        &self,
        asset_type: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<LogEntry>, DbError> {
        let rows = asset_type_logs::Entity::find()
            .filter(asset_type_logs::Column::AssetType.eq(strip_0x(asset_type)))
            .order_by_desc(asset_type_logs::Column::IsPending)
            .order_by_desc(asset_type_logs::Column::BlockNumber)
            .order_by_desc(asset_type_logs::Column::TransactionIndex)
            .order_by_desc(asset_type_logs::Column::TransactionHash)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| LogEntry {
                transaction_hash: row.transaction_hash,
                tracker: row.tracker,
                transaction_type: row.transaction_type,
                block_number: row.block_number,
                transaction_index: row.transaction_index,
                is_pending: row.is_pending,
                asset_type: Some(row.asset_type),
            })
            .collect())
    }

    /// Number of transactions touching an asset type
    pub async fn count_asset_type_logs(&self, asset_type: &str) -> Result<u64, DbError> {
        asset_type_logs::Entity::find()
            .filter(asset_type_logs::Column::AssetType.eq(strip_0x(asset_type)))
            .count(&self.conn)
            .await
            .map_err(Into::into)
    }

    /// Convert a database entity to a domain model
    pub fn to_domain_model(entity: transaction_logs::Model) -> LogEntry {
        LogEntry {
            transaction_hash: entity.transaction_hash,
            tracker: entity.tracker,
            transaction_type: entity.transaction_type,
            block_number: entity.block_number,
            transaction_index: entity.transaction_index,
            is_pending: entity.is_pending,
            asset_type: entity.asset_type,
        }
    }
}
