use sea_orm::DatabaseConnection;

use crate::infrastructure::persistence::connection::DbPool;
use crate::infrastructure::persistence::repositories::{
    AssetSchemeRepository, Repositories, SnapshotRepository, TransactionLogRepository,
    UtxoRepository,
};

/// Factory for creating repositories
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create all repositories
    pub fn create_repositories(db_pool: &DbPool) -> Repositories {
        Self::from_connection(db_pool.get_connection().clone())
    }

    /// Create all repositories sharing one connection
    pub fn from_connection(conn: DatabaseConnection) -> Repositories {
        Repositories::new(
            Self::create_asset_scheme_repository(conn.clone()),
            Self::create_snapshot_repository(conn.clone()),
            Self::create_transaction_log_repository(conn.clone()),
            Self::create_utxo_repository(conn),
        )
    }

    /// Create an asset scheme repository
    pub fn create_asset_scheme_repository(conn: DatabaseConnection) -> AssetSchemeRepository {
        AssetSchemeRepository::new(conn)
    }

    /// Create a snapshot repository
    pub fn create_snapshot_repository(conn: DatabaseConnection) -> SnapshotRepository {
        SnapshotRepository::new(conn)
    }

    /// Create a transaction log repository
    pub fn create_transaction_log_repository(conn: DatabaseConnection) -> TransactionLogRepository {
        TransactionLogRepository::new(conn)
    }

    /// Create a utxo repository
    pub fn create_utxo_repository(conn: DatabaseConnection) -> UtxoRepository {
        UtxoRepository::new(conn)
    }
}
