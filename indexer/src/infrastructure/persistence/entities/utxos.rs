//! SeaORM Entity for the UTXO index
//!
//! `order_block`/`order_index` hold the seek key of the descending total
//! order: the block position for confirmed outputs, `i64::MAX` for pending ones.
//! `spent_block_number` is the height of the confirmed spend, kept so
//! snapshots can evaluate liveness at a past height.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "utxos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub transaction_hash: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub output_index: i32,
    #[sea_orm(column_type = "Text")]
    pub tracker: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub owner: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub asset_type: String,
    pub shard_id: i32,
    #[sea_orm(column_type = "Text")]
    pub lock_script_hash: String,
    pub parameters: Json,
    #[sea_orm(column_type = "Text")]
    pub quantity: String,
    pub block_number: Option<i64>,
    pub transaction_index: Option<i32>,
    pub order_block: i64,
    pub order_index: i64,
    pub is_spent: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub spent_by: Option<String>,
    pub spent_block_number: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
