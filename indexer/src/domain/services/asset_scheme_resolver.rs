use async_trait::async_trait;

use crate::domain::models::AssetScheme;
use crate::infrastructure::persistence::error::DbError;

/// Looks up the scheme of an asset type, used to enrich query responses
#[async_trait]
pub trait AssetSchemeResolver: Send + Sync {
    /// Scheme minted by a confirmed transaction
    async fn get_asset_scheme(&self, asset_type: &str) -> Result<Option<AssetScheme>, DbError>;

    /// Scheme minted by a transaction that is still pending
    async fn get_pending_asset_scheme(
        &self,
        asset_type: &str,
    ) -> Result<Option<AssetScheme>, DbError>;

    /// Confirmed scheme, falling back to a pending one
    async fn resolve(&self, asset_type: &str) -> Result<Option<AssetScheme>, DbError> {
        match self.get_asset_scheme(asset_type).await? {
            Some(scheme) => Ok(Some(scheme)),
            None => self.get_pending_asset_scheme(asset_type).await,
        }
    }
}
