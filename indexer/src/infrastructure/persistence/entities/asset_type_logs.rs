//! SeaORM Entity for the asset-type activity log

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_type_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub transaction_hash: String,
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub asset_type: String,
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
