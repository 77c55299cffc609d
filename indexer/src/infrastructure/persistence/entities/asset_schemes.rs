//! Asset scheme entity for SeaORM

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_schemes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub asset_type: String,
    #[sea_orm(column_type = "Text")]
    pub network_id: String,
    pub shard_id: i32,
    #[sea_orm(column_type = "Text")]
    pub metadata: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub approver: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub registrar: Option<String>,
    pub allowed_script_hashes: Json,
    #[sea_orm(column_type = "Text")]
    pub supply: String,
    #[sea_orm(column_type = "Text")]
    pub transaction_hash: String,
    pub is_pending: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
