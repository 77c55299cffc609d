//! Access to the ledger node's view of the chain head.

pub mod error;
pub mod rpc;

pub use error::LedgerError;
pub use rpc::RpcLedgerHead;

use async_trait::async_trait;

/// Chain head oracle used for confirmation filtering and snapshot resolution
#[async_trait]
pub trait LedgerHead: Send + Sync + std::fmt::Debug {
    /// Height of the current best block
    async fn get_best_block_number(&self) -> Result<i64, LedgerError>;

    /// Unix timestamp of the block at `block_number`
    async fn get_block_timestamp(&self, block_number: i64) -> Result<i64, LedgerError>;

    /// Earliest block whose timestamp is at or after `timestamp`, or `None`
    /// when the chain has not produced such a block yet.
    ///
    /// Binary search over block timestamps, which never decrease with height.
    async fn find_block_at_or_after(&self, timestamp: i64) -> Result<Option<i64>, LedgerError> {
        let best = self.get_best_block_number().await?;
        if self.get_block_timestamp(best).await? < timestamp {
            return Ok(None);
        }

        let (mut low, mut high) = (0_i64, best);
        while low < high {
            let mid = low + (high - low) / 2;
            if self.get_block_timestamp(mid).await? >= timestamp {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        Ok(Some(low))
    }
}
