pub mod feed;
pub mod retry_handler;
pub mod transaction_log;

pub use feed::TransactionFeed;
pub use retry_handler::RetryHandler;
pub use transaction_log::TransactionLog;
