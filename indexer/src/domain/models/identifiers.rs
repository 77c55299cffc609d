//! Normalization of hex identifiers (hashes, trackers, asset types).

use crate::domain::errors::{IndexerError, IndexerResult};

/// Lowercase and drop a leading `0x`, the stored form of every hex identifier
pub fn strip_0x(value: &str) -> String {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

/// True when `value` (already stripped) is non-empty hex
pub fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a caller-supplied asset type: 20-byte or 32-byte hex
pub fn parse_asset_type(value: &str) -> IndexerResult<String> {
    let normalized = strip_0x(value);
    if is_hex(&normalized) && (normalized.len() == 40 || normalized.len() == 64) {
        Ok(normalized)
    } else {
        Err(IndexerError::validation(format!(
            "invalid asset type: {}",
            value
        )))
    }
}
