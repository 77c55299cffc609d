use std::sync::Arc;

use tokio::io::BufReader;

use asset_utxo_indexer::application::ingestion::TransactionFeed;
use asset_utxo_indexer::application::Services;
use asset_utxo_indexer::config::AppConfig;
use asset_utxo_indexer::domain::errors::IndexerResult;
use asset_utxo_indexer::infrastructure::ledger::{LedgerHead, RpcLedgerHead};
use asset_utxo_indexer::infrastructure::persistence::DbPool;
use asset_utxo_indexer::utils::logging;

#[tokio::main]
async fn main() -> IndexerResult<()> {
    logging::init_logger();

    let config = AppConfig::from_env();
    logging::log_info(&format!(
        "Starting asset-utxo-indexer v{} (ledger: {})",
        env!("CARGO_PKG_VERSION"),
        config.ledger.rpc_url
    ));

    let db_pool = DbPool::new(&config).await.map_err(|e| {
        logging::log_error(&format!("Failed to connect to database: {}", e));
        e
    })?;

    let ledger: Arc<dyn LedgerHead> = Arc::new(RpcLedgerHead::from_config(&config));
    let (services, worker) = Services::build(db_pool.get_connection().clone(), ledger, &config);
    let worker_handle = tokio::spawn(worker.start());

    // Transactions arrive on stdin, one JSON object per line
    let feed = TransactionFeed::new(Arc::clone(&services.transaction_log));
    let result = tokio::select! {
        result = feed.run(BufReader::new(tokio::io::stdin())) => match result {
            Ok(_) => wait_for_shutdown().await,
            Err(e) => Err(e),
        },
        result = wait_for_shutdown() => result,
    };

    logging::log_info("Shutting down");
    worker_handle.abort();
    result
}

async fn wait_for_shutdown() -> IndexerResult<()> {
    tokio::signal::ctrl_c().await.map_err(|e| {
        logging::log_error(&format!("Failed to listen for Ctrl+C: {}", e));
        e.into()
    })
}
