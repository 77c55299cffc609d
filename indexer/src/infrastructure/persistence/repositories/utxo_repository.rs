use std::str::FromStr;

use futures::TryStreamExt;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use crate::domain::models::utxo::PENDING_ORDER_KEY;
use crate::domain::models::{AggregatedUtxo, AssetTotals, Utxo, UtxoCursor, UtxoFilter, UtxoScope};
use crate::infrastructure::persistence::entities::utxos;
use crate::infrastructure::persistence::error::DbError;

const BATCH_SIZE: usize = 500;

/// Repository for the UTXO index.
/// Handles output creation and spend marking during ingestion, and the
/// ordered seek reads behind pagination, aggregation and snapshots.
#[derive(Debug, Clone)]
pub struct UtxoRepository {
    conn: DatabaseConnection,
}

/// A single output to be inserted
#[derive(Debug, Clone)]
pub struct UtxoInsert {
    pub transaction_hash: String,
    pub output_index: i32,
    pub tracker: String,
    pub owner: Option<String>,
    pub asset_type: String,
    pub shard_id: i32,
    pub lock_script_hash: String,
    pub parameters: Vec<String>,
    pub quantity: Decimal,
    pub block_number: Option<i64>,
    pub transaction_index: Option<i32>,
}

/// A previous output consumed by a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpentOutPoint {
    pub tracker: String,
    pub output_index: i32,
}

/// Key columns of a row, enough to advance a cursor
#[derive(Debug, FromQueryResult)]
struct OrderKey {
    order_block: i64,
    order_index: i64,
    transaction_hash: String,
    output_index: i32,
}

/// Columns needed to total a holding
#[derive(Debug, FromQueryResult)]
struct HeldQuantity {
    asset_type: String,
    quantity: String,
}

impl From<OrderKey> for UtxoCursor {
    fn from(key: OrderKey) -> Self {
        UtxoCursor {
            last_block_number: key.order_block,
            last_transaction_index: key.order_index,
            last_transaction_hash: Some(key.transaction_hash),
            last_output_index: Some(key.output_index),
        }
    }
}

impl UtxoRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the outputs created by a transaction
    pub async fn insert_outputs<C: ConnectionTrait>(
        &self,
        db: &C,
        outputs: Vec<UtxoInsert>,
    ) -> Result<usize, DbError> {
        if outputs.is_empty() {
            return Ok(0);
        }

        let total = outputs.len();
        let models: Vec<utxos::ActiveModel> = outputs.into_iter().map(Self::to_active_model).collect();
        for chunk in models.chunks(BATCH_SIZE) {
            utxos::Entity::insert_many(chunk.to_vec()).exec(db).await?;
        }

        Ok(total)
    }

    /// Mark the given previous outputs as spent by `spender_hash`.
    ///
    /// Returns the rows that were unspent before this call, so the caller can
    /// attribute the spend to their owners. Outpoints with no unspent row are
    /// left out of the result.
    pub async fn mark_spent<C: ConnectionTrait>(
        &self,
        db: &C,
        outpoints: &[SpentOutPoint],
        spender_hash: &str,
        spent_block_number: Option<i64>,
    ) -> Result<Vec<Utxo>, DbError> {
        let mut consumed = Vec::new();

        for chunk in outpoints.chunks(BATCH_SIZE) {
            let condition = chunk.iter().fold(Condition::any(), |condition, outpoint| {
                condition.add(
                    Condition::all()
                        .add(utxos::Column::Tracker.eq(outpoint.tracker.as_str()))
                        .add(utxos::Column::OutputIndex.eq(outpoint.output_index)),
                )
            });

            let rows = utxos::Entity::find()
                .filter(condition.clone())
                .filter(utxos::Column::IsSpent.eq(false))
                .all(db)
                .await?;
            if rows.is_empty() {
                continue;
            }

            utxos::Entity::update_many()
                .col_expr(utxos::Column::IsSpent, Expr::value(true))
                .col_expr(utxos::Column::SpentBy, Expr::value(Some(spender_hash.to_string())))
                .col_expr(utxos::Column::SpentBlockNumber, Expr::value(spent_block_number))
                .filter(condition)
                .filter(utxos::Column::IsSpent.eq(false))
                .exec(db)
                .await?;

            for row in rows {
                consumed.push(Self::to_domain_model(row)?);
            }
        }

        Ok(consumed)
    }

    /// Move the outputs of a newly confirmed transaction to its block position
    pub async fn confirm_outputs<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_hash: &str,
        block_number: i64,
        transaction_index: i32,
    ) -> Result<u64, DbError> {
        let result = utxos::Entity::update_many()
            .col_expr(utxos::Column::BlockNumber, Expr::value(Some(block_number)))
            .col_expr(utxos::Column::TransactionIndex, Expr::value(Some(transaction_index)))
            .col_expr(utxos::Column::OrderBlock, Expr::value(block_number))
            .col_expr(utxos::Column::OrderIndex, Expr::value(i64::from(transaction_index)))
            .filter(utxos::Column::TransactionHash.eq(transaction_hash))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Record the height of spends made by a newly confirmed transaction
    pub async fn confirm_spends<C: ConnectionTrait>(
        &self,
        db: &C,
        spender_hash: &str,
        block_number: i64,
    ) -> Result<u64, DbError> {
        let result = utxos::Entity::update_many()
            .col_expr(utxos::Column::SpentBlockNumber, Expr::value(Some(block_number)))
            .filter(utxos::Column::SpentBy.eq(spender_hash))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Up to `limit` rows of the scope strictly after `cursor`, in order
    pub async fn seek(
        &self,
        scope: &UtxoScope,
        filter: &UtxoFilter,
        cursor: Option<&UtxoCursor>,
        limit: u64,
    ) -> Result<Vec<Utxo>, DbError> {
        let rows = Self::ordered(Self::positioned(scope, filter, cursor))
            .limit(limit)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::to_domain_model).collect()
    }

    /// Same walk as `seek`, reading only the key columns
    pub async fn seek_keys(
        &self,
        scope: &UtxoScope,
        filter: &UtxoFilter,
        cursor: Option<&UtxoCursor>,
        limit: u64,
    ) -> Result<Vec<UtxoCursor>, DbError> {
        let keys = Self::ordered(Self::positioned(scope, filter, cursor))
            .select_only()
            .column(utxos::Column::OrderBlock)
            .column(utxos::Column::OrderIndex)
            .column(utxos::Column::TransactionHash)
            .column(utxos::Column::OutputIndex)
            .limit(limit)
            .into_model::<OrderKey>()
            .all(&self.conn)
            .await?;

        Ok(keys.into_iter().map(UtxoCursor::from).collect())
    }

    /// Every row of the scope, in order
    pub async fn list(&self, scope: &UtxoScope, filter: &UtxoFilter) -> Result<Vec<Utxo>, DbError> {
        let rows = Self::ordered(Self::positioned(scope, filter, None))
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::to_domain_model).collect()
    }

    /// Per-asset totals of the scope, streamed so a large holding is never
    /// loaded at once
    pub async fn sum_by_asset_type(
        &self,
        scope: &UtxoScope,
        filter: &UtxoFilter,
    ) -> Result<Vec<AggregatedUtxo>, DbError> {
        let mut rows = Self::scoped(scope, filter)
            .select_only()
            .column(utxos::Column::AssetType)
            .column(utxos::Column::Quantity)
            .into_model::<HeldQuantity>()
            .stream(&self.conn)
            .await?;

        let mut totals = AssetTotals::default();
        while let Some(row) = rows.try_next().await? {
            let quantity = Decimal::from_str(&row.quantity).map_err(|e| {
                DbError::DecodeError(format!("quantity of {} output: {}", row.asset_type, e))
            })?;
            totals.add(&row.asset_type, quantity);
        }

        Ok(totals.into_aggregates())
    }

    /// Outputs of `asset_type` that existed and were unspent at `block_number`
    pub async fn list_live_at(
        &self,
        asset_type: &str,
        block_number: i64,
    ) -> Result<Vec<Utxo>, DbError> {
        let rows = Self::ordered(
            utxos::Entity::find()
                .filter(utxos::Column::AssetType.eq(asset_type))
                .filter(utxos::Column::BlockNumber.lte(block_number))
                .filter(
                    Condition::any()
                        .add(utxos::Column::SpentBlockNumber.is_null())
                        .add(utxos::Column::SpentBlockNumber.gt(block_number)),
                ),
        )
        .all(&self.conn)
        .await?;

        rows.into_iter().map(Self::to_domain_model).collect()
    }

    fn scoped(scope: &UtxoScope, filter: &UtxoFilter) -> Select<utxos::Entity> {
        let query = utxos::Entity::find().filter(utxos::Column::IsSpent.eq(false));

        let query = match scope {
            UtxoScope::AssetType(asset_type) => {
                query.filter(utxos::Column::AssetType.eq(asset_type.as_str()))
            }
            UtxoScope::Owner {
                address,
                asset_type,
            } => {
                let query = query.filter(utxos::Column::Owner.eq(address.as_str()));
                match asset_type {
                    Some(asset_type) => query.filter(utxos::Column::AssetType.eq(asset_type.as_str())),
                    None => query,
                }
            }
        };

        if filter.only_confirmed {
            query.filter(utxos::Column::BlockNumber.lte(filter.confirmed_ceiling()))
        } else {
            query
        }
    }

    fn positioned(
        scope: &UtxoScope,
        filter: &UtxoFilter,
        cursor: Option<&UtxoCursor>,
    ) -> Select<utxos::Entity> {
        let query = Self::scoped(scope, filter);
        match cursor {
            Some(cursor) => query.filter(Self::after(cursor)),
            None => query,
        }
    }

    /// Rows strictly after `cursor` in the descending order
    fn after(cursor: &UtxoCursor) -> Condition {
        let block = cursor.last_block_number;
        let index = cursor.last_transaction_index;

        let mut condition = Condition::any()
            .add(utxos::Column::OrderBlock.lt(block))
            .add(
                Condition::all()
                    .add(utxos::Column::OrderBlock.eq(block))
                    .add(utxos::Column::OrderIndex.lt(index)),
            );

        if let Some(hash) = &cursor.last_transaction_hash {
            let same_position = Condition::all()
                .add(utxos::Column::OrderBlock.eq(block))
                .add(utxos::Column::OrderIndex.eq(index));

            condition = condition.add(
                same_position
                    .clone()
                    .add(utxos::Column::TransactionHash.lt(hash.as_str())),
            );
            if let Some(output_index) = cursor.last_output_index {
                condition = condition.add(
                    same_position
                        .add(utxos::Column::TransactionHash.eq(hash.as_str()))
                        .add(utxos::Column::OutputIndex.lt(output_index)),
                );
            }
        }

        condition
    }

    fn ordered(query: Select<utxos::Entity>) -> Select<utxos::Entity> {
        query
            .order_by_desc(utxos::Column::OrderBlock)
            .order_by_desc(utxos::Column::OrderIndex)
            .order_by_desc(utxos::Column::TransactionHash)
            .order_by_desc(utxos::Column::OutputIndex)
    }

    fn to_active_model(utxo: UtxoInsert) -> utxos::ActiveModel {
        let (order_block, order_index) = match (utxo.block_number, utxo.transaction_index) {
            (Some(block), Some(index)) => (block, i64::from(index)),
            _ => (PENDING_ORDER_KEY, PENDING_ORDER_KEY),
        };

        utxos::ActiveModel {
            transaction_hash: Set(utxo.transaction_hash),
            output_index: Set(utxo.output_index),
            tracker: Set(utxo.tracker),
            owner: Set(utxo.owner),
            asset_type: Set(utxo.asset_type),
            shard_id: Set(utxo.shard_id),
            lock_script_hash: Set(utxo.lock_script_hash),
            parameters: Set(serde_json::json!(utxo.parameters)),
            quantity: Set(utxo.quantity.to_string()),
            block_number: Set(utxo.block_number),
            transaction_index: Set(utxo.transaction_index),
            order_block: Set(order_block),
            order_index: Set(order_index),
            is_spent: Set(false),
            spent_by: Set(None),
            spent_block_number: Set(None),
        }
    }

    /// Convert a database entity to a domain model
    pub fn to_domain_model(entity: utxos::Model) -> Result<Utxo, DbError> {
        let quantity = Decimal::from_str(&entity.quantity).map_err(|e| {
            DbError::DecodeError(format!(
                "quantity of {}:{}: {}",
                entity.transaction_hash, entity.output_index, e
            ))
        })?;
        let parameters: Vec<String> = serde_json::from_value(entity.parameters).map_err(|e| {
            DbError::DecodeError(format!(
                "parameters of {}:{}: {}",
                entity.transaction_hash, entity.output_index, e
            ))
        })?;

        Ok(Utxo {
            transaction_hash: entity.transaction_hash,
            output_index: entity.output_index,
            tracker: entity.tracker,
            owner: entity.owner,
            asset_type: entity.asset_type,
            shard_id: entity.shard_id,
            lock_script_hash: entity.lock_script_hash,
            parameters,
            quantity,
            block_number: entity.block_number,
            transaction_index: entity.transaction_index,
        })
    }
}
