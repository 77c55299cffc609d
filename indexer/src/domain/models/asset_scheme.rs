use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Registration data of an asset type, created by its mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetScheme {
    pub asset_type: String,
    pub network_id: String,
    pub shard_id: i32,
    pub metadata: String,
    pub approver: Option<String>,
    pub registrar: Option<String>,
    pub allowed_script_hashes: Vec<String>,
    pub supply: Decimal,
    pub transaction_hash: String,
    pub is_pending: bool,
}
