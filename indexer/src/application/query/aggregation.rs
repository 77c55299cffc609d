use std::sync::Arc;

use crate::domain::errors::IndexerResult;
use crate::domain::models::{AggregatedUtxo, AggregatedUtxoWithScheme, UtxoFilter, UtxoScope};
use crate::domain::services::AssetSchemeResolver;
use crate::infrastructure::persistence::repositories::UtxoRepository;

/// Per-owner balance totals, computed over the same rows the owner listing returns
pub struct AggregationEngine {
    utxo_repository: UtxoRepository,
    asset_scheme_resolver: Arc<dyn AssetSchemeResolver>,
}

impl AggregationEngine {
    pub fn new(
        utxo_repository: UtxoRepository,
        asset_scheme_resolver: Arc<dyn AssetSchemeResolver>,
    ) -> Self {
        Self {
            utxo_repository,
            asset_scheme_resolver,
        }
    }

    /// Totals of every asset type `address` holds, ordered by asset type
    pub async fn aggregate(
        &self,
        address: &str,
        filter: &UtxoFilter,
    ) -> IndexerResult<Vec<AggregatedUtxo>> {
        let scope = UtxoScope::Owner {
            address: address.to_string(),
            asset_type: None,
        };
        Ok(self.utxo_repository.sum_by_asset_type(&scope, filter).await?)
    }

    /// Totals of one asset type held by `address`, `None` when it holds none
    pub async fn aggregate_by_asset_type(
        &self,
        address: &str,
        asset_type: &str,
        filter: &UtxoFilter,
    ) -> IndexerResult<Option<AggregatedUtxo>> {
        let scope = UtxoScope::Owner {
            address: address.to_string(),
            asset_type: Some(asset_type.to_string()),
        };
        let totals = self.utxo_repository.sum_by_asset_type(&scope, filter).await?;
        Ok(totals.into_iter().next())
    }

    pub async fn aggregate_with_schemes(
        &self,
        address: &str,
        filter: &UtxoFilter,
    ) -> IndexerResult<Vec<AggregatedUtxoWithScheme>> {
        let mut enriched = Vec::new();
        for aggregate in self.aggregate(address, filter).await? {
            enriched.push(self.enrich(aggregate).await?);
        }
        Ok(enriched)
    }

    pub async fn aggregate_by_asset_type_with_scheme(
        &self,
        address: &str,
        asset_type: &str,
        filter: &UtxoFilter,
    ) -> IndexerResult<Option<AggregatedUtxoWithScheme>> {
        match self.aggregate_by_asset_type(address, asset_type, filter).await? {
            Some(aggregate) => Ok(Some(self.enrich(aggregate).await?)),
            None => Ok(None),
        }
    }

    async fn enrich(&self, aggregate: AggregatedUtxo) -> IndexerResult<AggregatedUtxoWithScheme> {
        let asset_scheme = self
            .asset_scheme_resolver
            .resolve(&aggregate.asset_type)
            .await?;
        Ok(AggregatedUtxoWithScheme {
            aggregate,
            asset_scheme,
        })
    }
}
