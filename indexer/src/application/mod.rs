pub mod container;
pub mod ingestion;
pub mod query;
pub mod snapshot;

pub use container::Services;
