use std::error::Error;
use std::fmt;

use sea_orm::SqlErr;

/// Error type for database operations
#[derive(Debug)]
pub enum DbError {
    /// Error from SeaORM
    SeaOrmError(sea_orm::DbErr),
    /// Connection error
    ConnectionError(String),
    /// Query error
    QueryError(String),
    /// Stored value could not be decoded into its domain type
    DecodeError(String),
}

impl DbError {
    /// True when the statement collided with a primary key or unique index,
    /// which means a concurrent writer committed the same row first.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::SeaOrmError(e) => {
                matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
            }
            DbError::QueryError(msg) => {
                msg.contains("duplicate key") || msg.contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::SeaOrmError(e) => write!(f, "Database error: {}", e),
            DbError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            DbError::QueryError(msg) => write!(f, "Query error: {}", msg),
            DbError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DbError::SeaOrmError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for DbError {
    fn from(err: sea_orm::DbErr) -> Self {
        DbError::SeaOrmError(err)
    }
}
