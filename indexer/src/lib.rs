//! Asset UTXO indexer: ingests ledger asset transactions into a durable log,
//! derives the UTXO index from it and serves paginated, aggregated and
//! point-in-time snapshot queries.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod utils;
