use thiserror::Error;

use crate::infrastructure::ledger::LedgerError;
use crate::infrastructure::persistence::error::DbError;

/// Error type surfaced by ingestion, query and snapshot operations
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Malformed input, rejected before any state is touched
    #[error("Validation error: {0}")]
    Validation(String),
    /// Explicit lookup of something that does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// Update aimed at a transaction that was never recorded
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// Failure reading the transaction feed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexerError {
    pub fn validation(message: impl Into<String>) -> Self {
        IndexerError::Validation(message.into())
    }

    /// True for storage collisions that a re-run of the atomic unit resolves
    pub fn is_retryable(&self) -> bool {
        matches!(self, IndexerError::Database(e) if e.is_unique_violation())
    }
}

pub type IndexerResult<T> = Result<T, IndexerError>;

impl From<sea_orm::DbErr> for IndexerError {
    fn from(err: sea_orm::DbErr) -> Self {
        IndexerError::Database(DbError::from(err))
    }
}
