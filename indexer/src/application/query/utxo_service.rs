//! Read-side entry point: listings, aggregates and snapshots

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use super::aggregation::AggregationEngine;
use super::pagination::{PagePosition, UtxoPaginator};
use crate::application::snapshot::SnapshotScheduler;
use crate::config::QueryConfig;
use crate::domain::errors::{IndexerError, IndexerResult};
use crate::domain::models::identifiers::{parse_asset_type, strip_0x};
use crate::domain::models::{
    AddressActivity, AggregatedUtxoWithScheme, AssetScheme, LogEntry, SnapshotRequest, SnapshotResponse, UtxoCursor, UtxoFilter, UtxoPage,
    UtxoScope, UtxoWithScheme,
};
use crate::domain::services::AssetSchemeResolver;
use crate::infrastructure::ledger::LedgerHead;
use crate::infrastructure::persistence::repositories::TransactionLogRepository;

/// A parsed UTXO listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoQuery {
    pub scope: UtxoScope,
    pub position: PagePosition,
    pub items_per_page: u64,
    pub confirm_threshold: i64,
    pub only_confirmed: bool,
}

impl UtxoQuery {
    /// Build a query from string parameters.
    ///
    /// `address` selects an owner listing (optionally narrowed by
    /// `assetType`); otherwise `assetType` is required. An explicit
    /// `lastBlockNumber`/`lastTransactionIndex` pair takes precedence over
    /// `page`.
    pub fn from_params(params: &HashMap<String, String>, config: &QueryConfig) -> IndexerResult<Self> {
        let asset_type = params
            .get("assetType")
            .map(|value| parse_asset_type(value))
            .transpose()?;

        let scope = match (params.get("address"), asset_type) {
            (Some(address), asset_type) if !address.trim().is_empty() => UtxoScope::Owner {
                address: address.trim().to_string(),
                asset_type,
            },
            (_, Some(asset_type)) => UtxoScope::AssetType(asset_type),
            _ => {
                return Err(IndexerError::validation(
                    "either address or assetType is required",
                ))
            }
        };

        let items_per_page: u64 =
            parse_param(params, "itemsPerPage")?.unwrap_or(config.default_items_per_page);
        if items_per_page == 0 || items_per_page > config.max_items_per_page {
            return Err(IndexerError::validation(format!(
                "itemsPerPage must be between 1 and {}",
                config.max_items_per_page
            )));
        }

        let confirm_threshold: i64 =
            parse_param(params, "confirmThreshold")?.unwrap_or(config.default_confirm_threshold);
        if confirm_threshold < 0 {
            return Err(IndexerError::validation("confirmThreshold must not be negative"));
        }

        let only_confirmed: bool = parse_param(params, "onlyConfirmed")?.unwrap_or(false);

        let last_block_number: Option<i64> = parse_param(params, "lastBlockNumber")?;
        let last_transaction_index: Option<i64> = parse_param(params, "lastTransactionIndex")?;
        let last_output_index: Option<i32> = parse_param(params, "lastOutputIndex")?;
        let last_transaction_hash = params.get("lastTransactionHash").map(|h| strip_0x(h));

        let position = match (last_block_number, last_transaction_index) {
            (Some(block), Some(index)) => PagePosition::After(Some(UtxoCursor {
                last_block_number: block,
                last_transaction_index: index,
                last_output_index: last_output_index.filter(|_| last_transaction_hash.is_some()),
                last_transaction_hash,
            })),
            (None, None) => match parse_param::<u64>(params, "page")? {
                None | Some(1) => PagePosition::After(None),
                Some(0) => return Err(IndexerError::validation("page must be at least 1")),
                Some(page) => PagePosition::Page(page),
            },
            _ => {
                return Err(IndexerError::validation(
                    "lastBlockNumber and lastTransactionIndex must be given together",
                ))
            }
        };

        Ok(Self {
            scope,
            position,
            items_per_page,
            confirm_threshold,
            only_confirmed,
        })
    }
}

fn parse_param<T: FromStr>(params: &HashMap<String, String>, name: &str) -> IndexerResult<Option<T>> {
    match params.get(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            IndexerError::validation(format!("invalid {}: {}", name, raw))
        }),
    }
}

/// Operations offered to the HTTP layer
pub struct UtxoService {
    paginator: UtxoPaginator,
    aggregation: AggregationEngine,
    asset_scheme_resolver: Arc<dyn AssetSchemeResolver>,
    transaction_log_repository: TransactionLogRepository,
    ledger: Arc<dyn LedgerHead>,
    snapshots: Arc<SnapshotScheduler>,
    config: QueryConfig,
}

impl UtxoService {
    pub fn new(
        paginator: UtxoPaginator,
        aggregation: AggregationEngine,
        asset_scheme_resolver: Arc<dyn AssetSchemeResolver>,
        transaction_log_repository: TransactionLogRepository,
        ledger: Arc<dyn LedgerHead>,
        snapshots: Arc<SnapshotScheduler>,
        config: QueryConfig,
    ) -> Self {
        Self {
            paginator,
            aggregation,
            asset_scheme_resolver,
            transaction_log_repository,
            ledger,
            snapshots,
            config,
        }
    }

    /// One page of outputs, each with its asset scheme
    pub async fn list_utxo(&self, query: &UtxoQuery) -> IndexerResult<UtxoPage> {
        let filter = self
            .filter(query.confirm_threshold, query.only_confirmed)
            .await?;
        let (utxos, cursor) = self
            .paginator
            .fetch_page(&query.scope, &filter, &query.position, query.items_per_page)
            .await?;

        let mut schemes = HashMap::new();
        let mut entries = Vec::with_capacity(utxos.len());
        for utxo in utxos {
            if !schemes.contains_key(&utxo.asset_type) {
                let scheme = self.asset_scheme_resolver.resolve(&utxo.asset_type).await?;
                schemes.insert(utxo.asset_type.clone(), scheme);
            }
            let asset_scheme = schemes.get(&utxo.asset_type).cloned().flatten();
            entries.push(UtxoWithScheme { utxo, asset_scheme });
        }

        Ok(UtxoPage { entries, cursor })
    }

    pub async fn aggregate_utxo(
        &self,
        address: &str,
        confirm_threshold: Option<i64>,
        only_confirmed: bool,
    ) -> IndexerResult<Vec<AggregatedUtxoWithScheme>> {
        let filter = self
            .filter(
                confirm_threshold.unwrap_or(self.config.default_confirm_threshold),
                only_confirmed,
            )
            .await?;
        self.aggregation.aggregate_with_schemes(address, &filter).await
    }

    pub async fn aggregate_utxo_by_asset_type(
        &self,
        address: &str,
        asset_type: &str,
        confirm_threshold: Option<i64>,
        only_confirmed: bool,
    ) -> IndexerResult<Option<AggregatedUtxoWithScheme>> {
        let asset_type = parse_asset_type(asset_type)?;
        let filter = self
            .filter(
                confirm_threshold.unwrap_or(self.config.default_confirm_threshold),
                only_confirmed,
            )
            .await?;
        self.aggregation
            .aggregate_by_asset_type_with_scheme(address, &asset_type, &filter)
            .await
    }

    /// Confirmed scheme of an asset type, or its pending one before the mint
    /// is confirmed
    pub async fn get_asset_scheme(&self, asset_type: &str) -> IndexerResult<Option<AssetScheme>> {
        let asset_type = parse_asset_type(asset_type)?;
        Ok(self.asset_scheme_resolver.resolve(&asset_type).await?)
    }

    /// One page of the transactions touching an asset type, newest first
    /// with pending transactions leading. Pages start at 1.
    pub async fn list_asset_transactions(
        &self,
        asset_type: &str,
        page: u64,
        items_per_page: u64,
    ) -> IndexerResult<Vec<LogEntry>> {
        let asset_type = parse_asset_type(asset_type)?;
        let offset = self.page_offset(page, items_per_page)?;
        Ok(self
            .transaction_log_repository
            .find_asset_type_logs(&asset_type, offset, items_per_page)
            .await?)
    }

    /// One page of an address's activity, in the same order as
    /// [`Self::list_asset_transactions`]
    pub async fn list_address_transactions(
        &self,
        address: &str,
        page: u64,
        items_per_page: u64,
    ) -> IndexerResult<Vec<AddressActivity>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(IndexerError::validation("address is required"));
        }
        let offset = self.page_offset(page, items_per_page)?;
        Ok(self
            .transaction_log_repository
            .find_address_logs(address, offset, items_per_page)
            .await?)
    }

    pub async fn count_asset_transactions(&self, asset_type: &str) -> IndexerResult<u64> {
        let asset_type = parse_asset_type(asset_type)?;
        Ok(self
            .transaction_log_repository
            .count_asset_type_logs(&asset_type)
            .await?)
    }

    pub async fn request_snapshot(&self, asset_type: &str, target_date: &str) -> IndexerResult<String> {
        self.snapshots.request_snapshot(asset_type, target_date).await
    }

    pub async fn get_snapshot(&self, snapshot_id: &str) -> IndexerResult<SnapshotResponse> {
        self.snapshots.get_snapshot(snapshot_id).await
    }

    pub async fn list_snapshot_requests(&self) -> IndexerResult<Vec<SnapshotRequest>> {
        self.snapshots.list_requests().await
    }

    fn page_offset(&self, page: u64, items_per_page: u64) -> IndexerResult<u64> {
        if page == 0 {
            return Err(IndexerError::validation("page must be at least 1"));
        }
        if items_per_page == 0 || items_per_page > self.config.max_items_per_page {
            return Err(IndexerError::validation(format!(
                "itemsPerPage must be between 1 and {}",
                self.config.max_items_per_page
            )));
        }
        Ok((page - 1).saturating_mul(items_per_page))
    }

    /// Fix the best block once for the whole request
    async fn filter(&self, confirm_threshold: i64, only_confirmed: bool) -> IndexerResult<UtxoFilter> {
        Ok(UtxoFilter {
            best_block_number: self.ledger.get_best_block_number().await?,
            confirm_threshold,
            only_confirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: &str = "5300000000000000000000000000000000000000000000000000000000000001";

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = UtxoQuery::from_params(&params(&[("assetType", ASSET)]), &QueryConfig::default())
            .unwrap();

        assert_eq!(query.scope, UtxoScope::AssetType(ASSET.to_string()));
        assert_eq!(query.position, PagePosition::After(None));
        assert_eq!(query.items_per_page, 15);
        assert_eq!(query.confirm_threshold, 5);
        assert!(!query.only_confirmed);
    }

    #[test]
    fn test_cursor_takes_precedence_over_page() {
        let query = UtxoQuery::from_params(
            &params(&[
                ("address", "tca1owner"),
                ("page", "4"),
                ("lastBlockNumber", "104"),
                ("lastTransactionIndex", "2"),
            ]),
            &QueryConfig::default(),
        )
        .unwrap();

        assert_eq!(query.position, PagePosition::After(Some(UtxoCursor::new(104, 2))));
        assert_eq!(
            query.scope,
            UtxoScope::Owner {
                address: "tca1owner".to_string(),
                asset_type: None
            }
        );
    }

    #[test]
    fn test_page_number_is_parsed() {
        let query = UtxoQuery::from_params(
            &params(&[("assetType", ASSET), ("page", "3"), ("itemsPerPage", "100")]),
            &QueryConfig::default(),
        )
        .unwrap();

        assert_eq!(query.position, PagePosition::Page(3));
        assert_eq!(query.items_per_page, 100);
    }

    #[test]
    fn test_non_numeric_parameters_are_rejected() {
        let config = QueryConfig::default();
        for (name, value) in [
            ("page", "two"),
            ("itemsPerPage", "1e3"),
            ("lastBlockNumber", "x"),
            ("confirmThreshold", "-"),
            ("onlyConfirmed", "yes"),
        ] {
            let mut p = params(&[("assetType", ASSET), ("lastTransactionIndex", "0")]);
            if name != "lastBlockNumber" {
                p.remove("lastTransactionIndex");
            }
            p.insert(name.to_string(), value.to_string());
            assert!(
                matches!(UtxoQuery::from_params(&p, &config), Err(IndexerError::Validation(_))),
                "{} = {} should be rejected",
                name,
                value
            );
        }
    }

    #[test]
    fn test_page_size_bounds() {
        let config = QueryConfig::default();
        assert!(UtxoQuery::from_params(
            &params(&[("assetType", ASSET), ("itemsPerPage", "100000")]),
            &config
        )
        .is_ok());
        assert!(UtxoQuery::from_params(
            &params(&[("assetType", ASSET), ("itemsPerPage", "100001")]),
            &config
        )
        .is_err());
        assert!(UtxoQuery::from_params(
            &params(&[("assetType", ASSET), ("itemsPerPage", "0")]),
            &config
        )
        .is_err());
    }

    #[test]
    fn test_scope_is_required() {
        assert!(UtxoQuery::from_params(&params(&[]), &QueryConfig::default()).is_err());
        assert!(UtxoQuery::from_params(
            &params(&[("assetType", "not-hex")]),
            &QueryConfig::default()
        )
        .is_err());
    }

    #[test]
    fn test_half_cursor_is_rejected() {
        assert!(UtxoQuery::from_params(
            &params(&[("assetType", ASSET), ("lastBlockNumber", "10")]),
            &QueryConfig::default()
        )
        .is_err());
    }
}
