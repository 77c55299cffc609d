pub mod asset_scheme_repository;
pub mod snapshot_repository;
pub mod transaction_log_repository;
pub mod utxo_repository;

pub use asset_scheme_repository::AssetSchemeRepository;
pub use snapshot_repository::SnapshotRepository;
pub use transaction_log_repository::TransactionLogRepository;
pub use utxo_repository::{SpentOutPoint, UtxoInsert, UtxoRepository};

/// Collection of all repositories
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Repository for asset scheme operations
    pub asset_scheme: AssetSchemeRepository,
    /// Repository for snapshot request operations
    pub snapshot: SnapshotRepository,
    /// Repository for transaction log operations
    pub transaction_log: TransactionLogRepository,
    /// Repository for UTXO operations
    pub utxo: UtxoRepository,
}

impl Repositories {
    /// Create a new Repositories instance
    pub fn new(
        asset_scheme: AssetSchemeRepository,
        snapshot: SnapshotRepository,
        transaction_log: TransactionLogRepository,
        utxo: UtxoRepository,
    ) -> Self {
        Self {
            asset_scheme,
            snapshot,
            transaction_log,
            utxo,
        }
    }
}
