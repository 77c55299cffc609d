pub mod scheduler;
pub mod worker;

pub use scheduler::SnapshotScheduler;
pub use worker::SnapshotWorker;
