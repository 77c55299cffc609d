pub mod address_logs;
pub mod asset_schemes;
pub mod asset_type_logs;
pub mod snapshot_requests;
pub mod transaction_logs;
pub mod utxos;
