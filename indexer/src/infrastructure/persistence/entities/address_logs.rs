//! SeaORM Entity for the address activity log

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "address_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub transaction_hash: String,
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub address: String,
    /// `AssetOwner` for recipients, `Input` for owners of consumed outputs
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub kind: String,
    #[sea_orm(column_type = "Text")]
    pub tracker: String,
    #[sea_orm(column_type = "Text")]
    pub transaction_type: String,
    pub block_number: Option<i64>,
    pub transaction_index: Option<i32>,
    pub is_pending: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
