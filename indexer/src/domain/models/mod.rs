pub mod asset_scheme;
pub mod identifiers;
pub mod log_entry;
pub mod snapshot;
pub mod transaction;
pub mod utxo;

pub use asset_scheme::AssetScheme;
pub use log_entry::{AddressActivity, LogEntry};
pub use snapshot::{SnapshotRequest, SnapshotResponse, SnapshotStatus};
pub use transaction::{LedgerTransaction, TransactionAction};
pub use utxo::{
    AggregatedUtxo, AggregatedUtxoWithScheme, AssetTotals, Utxo, UtxoCursor, UtxoFilter, UtxoPage,
    UtxoScope, UtxoWithScheme,
};
