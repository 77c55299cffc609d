use serde::{Deserialize, Serialize};

/// A transaction as recorded in the transaction log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub transaction_hash: String,
    pub tracker: String,
    pub transaction_type: String,
    pub block_number: Option<i64>,
    pub transaction_index: Option<i32>,
    pub is_pending: bool,
    pub asset_type: Option<String>,
}

/// A logged transaction as seen from one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressActivity {
    #[serde(flatten)]
    pub entry: LogEntry,
    /// Whether the address received outputs or owned consumed inputs
    pub kind: String,
}
