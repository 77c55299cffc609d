use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::models::{SnapshotRequest, SnapshotResponse, SnapshotStatus, Utxo};
use crate::infrastructure::persistence::entities::snapshot_requests;
use crate::infrastructure::persistence::error::DbError;

/// Repository for snapshot requests and their materialized results
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    conn: DatabaseConnection,
}

impl SnapshotRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Store a pending request unless one with the same id exists.
    /// Returns true only when this call created the row.
    pub async fn insert_if_absent(
        &self,
        snapshot_id: &str,
        asset_type: &str,
        target_timestamp: i64,
    ) -> Result<bool, DbError> {
        if snapshot_requests::Entity::find_by_id(snapshot_id.to_string())
            .one(&self.conn)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let now = Utc::now();
        let model = snapshot_requests::ActiveModel {
            snapshot_id: Set(snapshot_id.to_string()),
            asset_type: Set(asset_type.to_string()),
            target_timestamp: Set(target_timestamp),
            block_number: Set(None),
            status: Set(SnapshotStatus::Pending.as_str().to_string()),
            utxos: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match snapshot_requests::Entity::insert(model).exec(&self.conn).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = DbError::from(e);
                // Lost the race to a concurrent request for the same id
                if err.is_unique_violation() {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Request with its outputs, if it exists
    pub async fn get(&self, snapshot_id: &str) -> Result<Option<SnapshotResponse>, DbError> {
        let Some(entity) = snapshot_requests::Entity::find_by_id(snapshot_id.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let utxos = match entity.utxos.clone() {
            Some(value) => Some(serde_json::from_value::<Vec<Utxo>>(value).map_err(|e| {
                DbError::DecodeError(format!("outputs of snapshot {}: {}", snapshot_id, e))
            })?),
            None => None,
        };

        Ok(Some(SnapshotResponse {
            request: Self::to_domain_model(entity)?,
            utxos,
        }))
    }

    /// Every request, oldest first
    pub async fn list_all(&self) -> Result<Vec<SnapshotRequest>, DbError> {
        snapshot_requests::Entity::find()
            .order_by_asc(snapshot_requests::Column::CreatedAt)
            .order_by_asc(snapshot_requests::Column::SnapshotId)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Self::to_domain_model)
            .collect()
    }

    /// Requests still waiting for their target block
    pub async fn list_pending(&self) -> Result<Vec<SnapshotRequest>, DbError> {
        snapshot_requests::Entity::find()
            .filter(snapshot_requests::Column::Status.eq(SnapshotStatus::Pending.as_str()))
            .order_by_asc(snapshot_requests::Column::CreatedAt)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Self::to_domain_model)
            .collect()
    }

    /// Store the result of a pending request. Returns false when the request
    /// was no longer pending, leaving an earlier result untouched.
    pub async fn mark_ready(
        &self,
        snapshot_id: &str,
        block_number: i64,
        utxos: &[Utxo],
    ) -> Result<bool, DbError> {
        let payload = serde_json::to_value(utxos)
            .map_err(|e| DbError::QueryError(format!("encoding snapshot outputs: {}", e)))?;

        let result = snapshot_requests::Entity::update_many()
            .col_expr(
                snapshot_requests::Column::Status,
                Expr::value(SnapshotStatus::Ready.as_str()),
            )
            .col_expr(snapshot_requests::Column::BlockNumber, Expr::value(Some(block_number)))
            .col_expr(snapshot_requests::Column::Utxos, Expr::value(Some(payload)))
            .col_expr(snapshot_requests::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(snapshot_requests::Column::SnapshotId.eq(snapshot_id))
            .filter(snapshot_requests::Column::Status.eq(SnapshotStatus::Pending.as_str()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Give up on a pending request
    pub async fn mark_failed(&self, snapshot_id: &str) -> Result<bool, DbError> {
        let result = snapshot_requests::Entity::update_many()
            .col_expr(
                snapshot_requests::Column::Status,
                Expr::value(SnapshotStatus::Failed.as_str()),
            )
            .col_expr(snapshot_requests::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(snapshot_requests::Column::SnapshotId.eq(snapshot_id))
            .filter(snapshot_requests::Column::Status.eq(SnapshotStatus::Pending.as_str()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Put a failed request back in the pending state
    pub async fn reset_failed(&self, snapshot_id: &str) -> Result<bool, DbError> {
        let result = snapshot_requests::Entity::update_many()
            .col_expr(
                snapshot_requests::Column::Status,
                Expr::value(SnapshotStatus::Pending.as_str()),
            )
            .col_expr(snapshot_requests::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(snapshot_requests::Column::SnapshotId.eq(snapshot_id))
            .filter(snapshot_requests::Column::Status.eq(SnapshotStatus::Failed.as_str()))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Convert a database entity to a domain model
    pub fn to_domain_model(entity: snapshot_requests::Model) -> Result<SnapshotRequest, DbError> {
        let status = entity
            .status
            .parse::<SnapshotStatus>()
            .map_err(DbError::DecodeError)?;

        Ok(SnapshotRequest {
            snapshot_id: entity.snapshot_id,
            asset_type: entity.asset_type,
            target_timestamp: entity.target_timestamp,
            block_number: entity.block_number,
            status,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
