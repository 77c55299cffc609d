use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::utxo::Utxo;
use crate::domain::errors::{IndexerError, IndexerResult};

/// Lifecycle of a snapshot request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Pending,
    Ready,
    Failed,
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Pending => "pending",
            SnapshotStatus::Ready => "ready",
            SnapshotStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SnapshotStatus::Pending),
            "ready" => Ok(SnapshotStatus::Ready),
            "failed" => Ok(SnapshotStatus::Failed),
            other => Err(format!("unknown snapshot status: {}", other)),
        }
    }
}

/// A request to materialize the UTXO set of one asset type at a past time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    pub snapshot_id: String,
    pub asset_type: String,
    pub target_timestamp: i64,
    pub block_number: Option<i64>,
    pub status: SnapshotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A request together with its materialized outputs, once ready
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    #[serde(flatten)]
    pub request: SnapshotRequest,
    pub utxos: Option<Vec<Utxo>>,
}

/// Deterministic identifier of the snapshot of `asset_type` at `timestamp`
pub fn snapshot_id(asset_type: &str, timestamp: i64) -> String {
    format!("{}-{}", asset_type, timestamp)
}

/// Parse a target date into a unix timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`; the last two are
/// read as UTC.
pub fn parse_target_date(date: &str) -> IndexerResult<i64> {
    let trimmed = date.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.timestamp());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime.and_utc().timestamp());
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().timestamp());
        }
    }
    Err(IndexerError::validation(format!("invalid date format: {}", date)))
}
