//! Decoded ledger transactions fed into the indexer.
//!
//! Each asset transaction kind is a variant of [`TransactionAction`], tagged by
//! the `type` field of its JSON form. Unknown kinds fail to decode.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identifiers::{is_hex, strip_0x};
use crate::domain::errors::{IndexerError, IndexerResult};

/// A ledger transaction, confirmed (with block position) or pending (without)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub hash: String,
    pub tracker: String,
    pub network_id: String,
    pub block_number: Option<i64>,
    pub transaction_index: Option<i32>,
    pub action: TransactionAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionAction {
    MintAsset(MintAsset),
    TransferAsset(TransferAsset),
    IncreaseAssetSupply(IncreaseAssetSupply),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintAsset {
    pub shard_id: u16,
    pub asset_type: String,
    #[serde(default)]
    pub metadata: String,
    pub approver: Option<String>,
    pub registrar: Option<String>,
    #[serde(default)]
    pub allowed_script_hashes: Vec<String>,
    pub output: AssetMintOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMintOutput {
    pub lock_script_hash: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub supply: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAsset {
    #[serde(default)]
    pub inputs: Vec<AssetTransferInput>,
    #[serde(default)]
    pub burns: Vec<AssetTransferInput>,
    #[serde(default)]
    pub outputs: Vec<AssetTransferOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransferInput {
    pub prev_out: AssetOutPoint,
}

/// Reference to an output by the tracker of the transaction that created it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOutPoint {
    pub tracker: String,
    pub index: u32,
    pub asset_type: String,
    pub shard_id: u16,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransferOutput {
    pub lock_script_hash: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub asset_type: String,
    pub shard_id: u16,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncreaseAssetSupply {
    pub shard_id: u16,
    pub asset_type: String,
    #[serde(default)]
    pub seq: u64,
    pub output: AssetMintOutput,
}

/// An output created by a transaction, in the shape the UTXO index stores
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOutput<'a> {
    pub output_index: i32,
    pub lock_script_hash: &'a str,
    pub parameters: &'a [String],
    pub asset_type: &'a str,
    pub shard_id: u16,
    pub quantity: Decimal,
}

impl LedgerTransaction {
    /// Decode and validate a transaction from its JSON form
    pub fn from_json(value: Value) -> IndexerResult<Self> {
        let tx: LedgerTransaction = serde_json::from_value(value)
            .map_err(|e| IndexerError::validation(format!("undecodable transaction: {}", e)))?;
        tx.validate()?;
        Ok(tx)
    }

    /// Check mandatory fields and value ranges
    pub fn validate(&self) -> IndexerResult<()> {
        if !is_hex(&strip_0x(&self.hash)) {
            return Err(IndexerError::validation("transaction hash is missing or not hex"));
        }
        if !is_hex(&strip_0x(&self.tracker)) {
            return Err(IndexerError::validation(format!(
                "transaction {} has no valid tracker",
                self.hash
            )));
        }
        match (self.block_number, self.transaction_index) {
            (Some(block), Some(index)) if block >= 0 && index >= 0 => {}
            (None, None) => {}
            _ => {
                return Err(IndexerError::validation(format!(
                    "transaction {} has an inconsistent block position",
                    self.hash
                )))
            }
        }

        let created: Vec<Decimal> = self.created_outputs().iter().map(|o| o.quantity).collect();
        if let Some(empty) = created.iter().position(|q| q.is_zero()) {
            return Err(IndexerError::validation(format!(
                "transaction {} creates output {} with zero quantity",
                self.hash, empty
            )));
        }

        let mut quantities = created;
        quantities.extend(self.spent_outpoints().iter().map(|p| p.quantity));
        if let Some(bad) = quantities
            .iter()
            .find(|q| q.is_sign_negative() || !q.fract().is_zero())
        {
            return Err(IndexerError::validation(format!(
                "transaction {} carries invalid quantity {}",
                self.hash, bad
            )));
        }
        Ok(())
    }

    /// Stable tag of the transaction kind, as stored in the log
    pub fn type_tag(&self) -> &'static str {
        match self.action {
            TransactionAction::MintAsset(_) => "mintAsset",
            TransactionAction::TransferAsset(_) => "transferAsset",
            TransactionAction::IncreaseAssetSupply(_) => "increaseAssetSupply",
        }
    }

    pub fn position(&self) -> Option<(i64, i32)> {
        self.block_number.zip(self.transaction_index)
    }

    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }

    /// Outputs this transaction creates, numbered by output index
    pub fn created_outputs(&self) -> Vec<CreatedOutput<'_>> {
        match &self.action {
            TransactionAction::MintAsset(mint) => vec![CreatedOutput {
                output_index: 0,
                lock_script_hash: &mint.output.lock_script_hash,
                parameters: &mint.output.parameters,
                asset_type: &mint.asset_type,
                shard_id: mint.shard_id,
                quantity: mint.output.supply,
            }],
            TransactionAction::IncreaseAssetSupply(increase) => vec![CreatedOutput {
                output_index: 0,
                lock_script_hash: &increase.output.lock_script_hash,
                parameters: &increase.output.parameters,
                asset_type: &increase.asset_type,
                shard_id: increase.shard_id,
                quantity: increase.output.supply,
            }],
            TransactionAction::TransferAsset(transfer) => transfer
                .outputs
                .iter()
                .enumerate()
                .map(|(index, output)| CreatedOutput {
                    output_index: index as i32,
                    lock_script_hash: &output.lock_script_hash,
                    parameters: &output.parameters,
                    asset_type: &output.asset_type,
                    shard_id: output.shard_id,
                    quantity: output.quantity,
                })
                .collect(),
        }
    }

    /// Outputs consumed by this transaction (inputs and burns)
    pub fn spent_outpoints(&self) -> Vec<&AssetOutPoint> {
        match &self.action {
            TransactionAction::TransferAsset(transfer) => transfer
                .inputs
                .iter()
                .chain(transfer.burns.iter())
                .map(|input| &input.prev_out)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every asset type this transaction touches, normalized
    pub fn asset_types(&self) -> BTreeSet<String> {
        self.created_outputs()
            .iter()
            .map(|o| strip_0x(o.asset_type))
            .chain(self.spent_outpoints().iter().map(|p| strip_0x(&p.asset_type)))
            .collect()
    }

    /// Asset type the log entry is filed under when the caller gives none
    pub fn primary_asset_type(&self) -> Option<String> {
        match &self.action {
            TransactionAction::MintAsset(mint) => Some(strip_0x(&mint.asset_type)),
            TransactionAction::IncreaseAssetSupply(increase) => Some(strip_0x(&increase.asset_type)),
            TransactionAction::TransferAsset(transfer) => transfer
                .outputs
                .first()
                .map(|o| strip_0x(&o.asset_type))
                .or_else(|| {
                    transfer
                        .inputs
                        .iter()
                        .chain(transfer.burns.iter())
                        .next()
                        .map(|i| strip_0x(&i.prev_out.asset_type))
                }),
        }
    }
}
