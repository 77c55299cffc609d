//! SeaORM Entity for snapshot requests

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "snapshot_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub snapshot_id: String,
    #[sea_orm(column_type = "Text")]
    pub asset_type: String,
    pub target_timestamp: i64,
    pub block_number: Option<i64>,
    #[sea_orm(column_type = "Text")]
    pub status: String,
    /// Materialized outputs, written once when the request becomes ready
    #[sea_orm(nullable)]
    pub utxos: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
