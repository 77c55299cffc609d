use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};

use crate::domain::models::identifiers::strip_0x;
use crate::domain::models::transaction::MintAsset;
use crate::domain::models::{AssetScheme, LedgerTransaction};
use crate::domain::services::AssetSchemeResolver;
use crate::infrastructure::persistence::entities::asset_schemes;
use crate::infrastructure::persistence::error::DbError;
use crate::utils::logging;

/// Repository for asset schemes registered by mint transactions
#[derive(Debug, Clone)]
pub struct AssetSchemeRepository {
    db: DatabaseConnection,
}

impl AssetSchemeRepository {
    /// Create a new AssetSchemeRepository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register the scheme minted by `tx`. Returns false when the asset type
    /// already has a scheme.
    pub async fn insert_mint<C: ConnectionTrait>(
        &self,
        db: &C,
        tx: &LedgerTransaction,
        mint: &MintAsset,
    ) -> Result<bool, DbError> {
        let asset_type = strip_0x(&mint.asset_type);
        if asset_schemes::Entity::find_by_id(asset_type.clone())
            .one(db)
            .await?
            .is_some()
        {
            logging::log_warning(&format!(
                "Asset type {} already has a scheme, ignoring mint {}",
                asset_type, tx.hash
            ));
            return Ok(false);
        }

        let model = asset_schemes::ActiveModel {
            asset_type: Set(asset_type),
            network_id: Set(tx.network_id.clone()),
            shard_id: Set(i32::from(mint.shard_id)),
            metadata: Set(mint.metadata.clone()),
            approver: Set(mint.approver.as_deref().map(strip_0x)),
            registrar: Set(mint.registrar.as_deref().map(strip_0x)),
            allowed_script_hashes: Set(serde_json::json!(mint
                .allowed_script_hashes
                .iter()
                .map(|h| strip_0x(h))
                .collect::<Vec<_>>())),
            supply: Set(mint.output.supply.to_string()),
            transaction_hash: Set(strip_0x(&tx.hash)),
            is_pending: Set(tx.is_pending()),
        };
        asset_schemes::Entity::insert(model).exec(db).await?;

        Ok(true)
    }

    /// Add `amount` to the recorded supply of `asset_type`
    pub async fn increase_supply<C: ConnectionTrait>(
        &self,
        db: &C,
        asset_type: &str,
        amount: Decimal,
    ) -> Result<bool, DbError> {
        let asset_type = strip_0x(asset_type);
        let Some(scheme) = asset_schemes::Entity::find_by_id(asset_type.clone())
            .one(db)
            .await?
        else {
            logging::log_warning(&format!(
                "Supply increase for unknown asset type {}",
                asset_type
            ));
            return Ok(false);
        };

        let supply = Self::decode_supply(&scheme)? + amount;
        let mut active = scheme.into_active_model();
        active.supply = Set(supply.to_string());
        active.update(db).await?;

        Ok(true)
    }

    /// Clear the pending flag of the scheme minted by `transaction_hash`
    pub async fn confirm<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_hash: &str,
    ) -> Result<u64, DbError> {
        let result = asset_schemes::Entity::update_many()
            .col_expr(asset_schemes::Column::IsPending, Expr::value(false))
            .filter(asset_schemes::Column::TransactionHash.eq(strip_0x(transaction_hash)))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn find(&self, asset_type: &str, pending: bool) -> Result<Option<AssetScheme>, DbError> {
        asset_schemes::Entity::find_by_id(strip_0x(asset_type))
            .filter(asset_schemes::Column::IsPending.eq(pending))
            .one(&self.db)
            .await?
            .map(Self::to_domain_model)
            .transpose()
    }

    fn decode_supply(entity: &asset_schemes::Model) -> Result<Decimal, DbError> {
        Decimal::from_str(&entity.supply).map_err(|e| {
            DbError::DecodeError(format!("supply of {}: {}", entity.asset_type, e))
        })
    }

    /// Convert a database entity to a domain model
    pub fn to_domain_model(entity: asset_schemes::Model) -> Result<AssetScheme, DbError> {
        let supply = Self::decode_supply(&entity)?;
        let allowed_script_hashes: Vec<String> =
            serde_json::from_value(entity.allowed_script_hashes).map_err(|e| {
                DbError::DecodeError(format!(
                    "allowed script hashes of {}: {}",
                    entity.asset_type, e
                ))
            })?;

        Ok(AssetScheme {
            asset_type: entity.asset_type,
            network_id: entity.network_id,
            shard_id: entity.shard_id,
            metadata: entity.metadata,
            approver: entity.approver,
            registrar: entity.registrar,
            allowed_script_hashes,
            supply,
            transaction_hash: entity.transaction_hash,
            is_pending: entity.is_pending,
        })
    }
}

#[async_trait]
impl AssetSchemeResolver for AssetSchemeRepository {
    async fn get_asset_scheme(&self, asset_type: &str) -> Result<Option<AssetScheme>, DbError> {
        self.find(asset_type, false).await
    }

    async fn get_pending_asset_scheme(
        &self,
        asset_type: &str,
    ) -> Result<Option<AssetScheme>, DbError> {
        self.find(asset_type, true).await
    }
}
