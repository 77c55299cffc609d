use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset_scheme::AssetScheme;

/// Order key carried by outputs of pending transactions. Sorts above every
/// confirmed block in the descending UTXO order.
pub const PENDING_ORDER_KEY: i64 = i64::MAX;

/// An unspent output as served to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
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

impl Utxo {
    /// Position of this output in the UTXO total order
    pub fn cursor(&self) -> UtxoCursor {
        UtxoCursor {
            last_block_number: self.block_number.unwrap_or(PENDING_ORDER_KEY),
            last_transaction_index: self
                .transaction_index
                .map(i64::from)
                .unwrap_or(PENDING_ORDER_KEY),
            last_transaction_hash: Some(self.transaction_hash.clone()),
            last_output_index: Some(self.output_index),
        }
    }
}

/// Resume point in the order (block desc, transaction index desc, hash desc,
/// output index desc).
///
/// A cursor holding only the block and transaction index resumes after the
/// whole transaction; the optional hash and output index pin an exact output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoCursor {
    pub last_block_number: i64,
    pub last_transaction_index: i64,
    pub last_transaction_hash: Option<String>,
    pub last_output_index: Option<i32>,
}

impl UtxoCursor {
    pub fn new(last_block_number: i64, last_transaction_index: i64) -> Self {
        Self {
            last_block_number,
            last_transaction_index,
            last_transaction_hash: None,
            last_output_index: None,
        }
    }
}

/// Confirmation parameters, fixed once at the start of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoFilter {
    pub best_block_number: i64,
    pub confirm_threshold: i64,
    pub only_confirmed: bool,
}

impl UtxoFilter {
    /// Highest block whose outputs count as confirmed:
    /// `best - block >= threshold` iff `block <= best - threshold`
    pub fn confirmed_ceiling(&self) -> i64 {
        self.best_block_number.saturating_sub(self.confirm_threshold)
    }
}

/// Which slice of the UTXO index a query reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtxoScope {
    AssetType(String),
    Owner {
        address: String,
        asset_type: Option<String>,
    },
}

/// Per-asset totals for one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedUtxo {
    pub asset_type: String,
    pub total_quantity: Decimal,
    pub utxo_count: u64,
}

/// Running per-asset totals, kept in asset type order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetTotals {
    totals: BTreeMap<String, (Decimal, u64)>,
}

impl AssetTotals {
    pub fn add(&mut self, asset_type: &str, quantity: Decimal) {
        let entry = match self.totals.get_mut(asset_type) {
            Some(entry) => entry,
            None => self
                .totals
                .entry(asset_type.to_string())
                .or_insert((Decimal::ZERO, 0)),
        };
        entry.0 += quantity;
        entry.1 += 1;
    }

    pub fn into_aggregates(self) -> Vec<AggregatedUtxo> {
        self.totals
            .into_iter()
            .map(|(asset_type, (total_quantity, utxo_count))| AggregatedUtxo {
                asset_type,
                total_quantity,
                utxo_count,
            })
            .collect()
    }
}

/// Aggregate enriched with the scheme of its asset type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedUtxoWithScheme {
    #[serde(flatten)]
    pub aggregate: AggregatedUtxo,
    pub asset_scheme: Option<AssetScheme>,
}

/// A listed output enriched with the scheme of its asset type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoWithScheme {
    #[serde(flatten)]
    pub utxo: Utxo,
    pub asset_scheme: Option<AssetScheme>,
}

/// One page of outputs plus the cursor to resume after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoPage {
    pub entries: Vec<UtxoWithScheme>,
    pub cursor: Option<UtxoCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utxo(block_number: Option<i64>, transaction_index: Option<i32>) -> Utxo {
        Utxo {
            transaction_hash: "aa".to_string(),
            output_index: 3,
            tracker: "bb".to_string(),
            owner: None,
            asset_type: "cc".to_string(),
            shard_id: 0,
            lock_script_hash: "dd".to_string(),
            parameters: vec![],
            quantity: Decimal::from(1),
            block_number,
            transaction_index,
        }
    }

    #[test]
    fn test_cursor_of_confirmed_output() {
        let cursor = utxo(Some(104), Some(7)).cursor();
        assert_eq!(cursor.last_block_number, 104);
        assert_eq!(cursor.last_transaction_index, 7);
        assert_eq!(cursor.last_output_index, Some(3));
    }

    #[test]
    fn test_cursor_of_pending_output_uses_sentinel() {
        let cursor = utxo(None, None).cursor();
        assert_eq!(cursor.last_block_number, PENDING_ORDER_KEY);
        assert_eq!(cursor.last_transaction_index, PENDING_ORDER_KEY);
    }

    #[test]
    fn test_totals_group_by_asset_type() {
        let mut totals = AssetTotals::default();
        totals.add("bb", Decimal::from(5));
        totals.add("aa", Decimal::from(10));
        totals.add("bb", Decimal::from(7));

        let aggregates = totals.into_aggregates();
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].asset_type, "aa");
        assert_eq!(aggregates[0].total_quantity, Decimal::from(10));
        assert_eq!(aggregates[0].utxo_count, 1);
        assert_eq!(aggregates[1].asset_type, "bb");
        assert_eq!(aggregates[1].total_quantity, Decimal::from(12));
        assert_eq!(aggregates[1].utxo_count, 2);
    }

    #[test]
    fn test_totals_keep_precision_of_large_quantities() {
        let big = Decimal::from(u64::MAX);
        let mut totals = AssetTotals::default();
        totals.add("aa", big);
        totals.add("aa", big);

        assert_eq!(totals.into_aggregates()[0].total_quantity, big + big);
    }

    #[test]
    fn test_empty_totals() {
        assert!(AssetTotals::default().into_aggregates().is_empty());
    }

    #[test]
    fn test_confirmed_ceiling() {
        let filter = UtxoFilter {
            best_block_number: 106,
            confirm_threshold: 5,
            only_confirmed: true,
        };
        assert_eq!(filter.confirmed_ceiling(), 101);
    }
}
