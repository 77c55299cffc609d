//! Line-delimited JSON transaction feed

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::retry_handler::RetryHandler;
use super::transaction_log::TransactionLog;
use crate::domain::errors::{IndexerError, IndexerResult};
use crate::domain::models::LedgerTransaction;
use crate::utils::logging;

/// Reads one JSON transaction per line and records each in order.
///
/// Storage and ledger failures are retried. Anything that is still failing
/// afterwards, or a record that can never be accepted, stops the feed so that
/// no later transaction is recorded on top of a gap.
pub struct TransactionFeed {
    transaction_log: Arc<TransactionLog>,
    retry_handler: RetryHandler,
}

impl TransactionFeed {
    pub fn new(transaction_log: Arc<TransactionLog>) -> Self {
        Self {
            transaction_log,
            retry_handler: RetryHandler::new(),
        }
    }

    pub fn with_retry_handler(mut self, retry_handler: RetryHandler) -> Self {
        self.retry_handler = retry_handler;
        self
    }

    /// Consume `reader` until end of input. Returns how many transactions
    /// were recorded.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, reader: R) -> IndexerResult<u64> {
        let mut lines = reader.lines();
        let mut recorded = 0;
        let mut line_number = 0_u64;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let tx = Self::decode(&line).map_err(|e| {
                logging::log_error(&format!("Feed line {} rejected: {}", line_number, e));
                e
            })?;

            self.retry_handler
                .execute_with_retry(
                    || self.transaction_log.record_transaction(&tx, None),
                    "feed record_transaction",
                    Self::is_retryable,
                )
                .await
                .map_err(|e| {
                    logging::log_error(&format!(
                        "Feed stopped at line {} ({}): {}",
                        line_number, tx.hash, e
                    ));
                    e
                })?;
            recorded += 1;
        }

        logging::log_info(&format!("Transaction feed closed after {} records", recorded));
        Ok(recorded)
    }

    fn decode(line: &str) -> IndexerResult<LedgerTransaction> {
        let value = serde_json::from_str(line)
            .map_err(|e| IndexerError::validation(format!("invalid JSON: {}", e)))?;
        LedgerTransaction::from_json(value)
    }

    fn is_retryable(error: &IndexerError) -> bool {
        matches!(error, IndexerError::Database(_) | IndexerError::Ledger(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ledger::LedgerError;
    use crate::infrastructure::persistence::error::DbError;

    #[test]
    fn test_only_storage_and_ledger_errors_are_retried() {
        assert!(TransactionFeed::is_retryable(&IndexerError::Database(
            DbError::QueryError("locked".to_string())
        )));
        assert!(TransactionFeed::is_retryable(&IndexerError::Ledger(
            LedgerError::NetworkError("timeout".to_string())
        )));
        assert!(!TransactionFeed::is_retryable(&IndexerError::validation("bad")));
        assert!(!TransactionFeed::is_retryable(&IndexerError::Conflict(
            "unknown".to_string()
        )));
    }

    #[test]
    fn test_garbage_line_is_a_validation_error() {
        assert!(matches!(
            TransactionFeed::decode("{not json"),
            Err(IndexerError::Validation(_))
        ));
        assert!(matches!(
            TransactionFeed::decode("{\"hash\": \"aa\"}"),
            Err(IndexerError::Validation(_))
        ));
    }
}
