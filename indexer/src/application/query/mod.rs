pub mod aggregation;
pub mod pagination;
pub mod utxo_service;

pub use aggregation::AggregationEngine;
pub use pagination::{PagePosition, UtxoPaginator};
pub use utxo_service::{UtxoQuery, UtxoService};
