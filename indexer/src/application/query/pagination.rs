//! Seek-based pagination over the UTXO total order.
//!
//! A page number is turned into a resume cursor by walking the key columns
//! in bounded chunks, so deep pages never need an offset scan.

use crate::domain::errors::IndexerResult;
use crate::domain::models::{Utxo, UtxoCursor, UtxoFilter, UtxoScope};
use crate::infrastructure::persistence::repositories::UtxoRepository;
use crate::utils::logging;

/// Where a page starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagePosition {
    /// Strictly after the given cursor; `None` starts before the first entry
    After(Option<UtxoCursor>),
    /// 1-based page number
    Page(u64),
}

impl Default for PagePosition {
    fn default() -> Self {
        PagePosition::After(None)
    }
}

enum SeekOutcome {
    Positioned(Option<UtxoCursor>),
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct UtxoPaginator {
    utxo_repository: UtxoRepository,
    seek_chunk_size: u64,
}

impl UtxoPaginator {
    pub fn new(utxo_repository: UtxoRepository, seek_chunk_size: u64) -> Self {
        Self {
            utxo_repository,
            seek_chunk_size: seek_chunk_size.max(1),
        }
    }

    /// Page of unspent outputs of one asset type
    pub async fn list_by_asset_type(
        &self,
        asset_type: &str,
        filter: &UtxoFilter,
        position: &PagePosition,
        items_per_page: u64,
    ) -> IndexerResult<(Vec<Utxo>, Option<UtxoCursor>)> {
        let scope = UtxoScope::AssetType(asset_type.to_string());
        self.fetch_page(&scope, filter, position, items_per_page).await
    }

    /// Page of unspent outputs held by one address
    pub async fn list_by_owner(
        &self,
        address: &str,
        asset_type: Option<&str>,
        filter: &UtxoFilter,
        position: &PagePosition,
        items_per_page: u64,
    ) -> IndexerResult<(Vec<Utxo>, Option<UtxoCursor>)> {
        let scope = UtxoScope::Owner {
            address: address.to_string(),
            asset_type: asset_type.map(str::to_string),
        };
        self.fetch_page(&scope, filter, position, items_per_page).await
    }

    /// Entries of the page and the cursor after its last entry. The cursor is
    /// `None` when the page came back short, meaning nothing follows it.
    pub async fn fetch_page(
        &self,
        scope: &UtxoScope,
        filter: &UtxoFilter,
        position: &PagePosition,
        items_per_page: u64,
    ) -> IndexerResult<(Vec<Utxo>, Option<UtxoCursor>)> {
        if items_per_page == 0 {
            return Ok((Vec::new(), None));
        }

        let start = match position {
            PagePosition::After(cursor) => cursor.clone(),
            PagePosition::Page(page) => {
                let skip = page.saturating_sub(1).saturating_mul(items_per_page);
                match self.seek_start(scope, filter, skip).await? {
                    SeekOutcome::Positioned(cursor) => cursor,
                    SeekOutcome::Exhausted => return Ok((Vec::new(), None)),
                }
            }
        };

        let entries = self
            .utxo_repository
            .seek(scope, filter, start.as_ref(), items_per_page)
            .await?;
        let next = if entries.len() as u64 == items_per_page {
            entries.last().map(Utxo::cursor)
        } else {
            None
        };

        Ok((entries, next))
    }

    /// Cursor sitting after the first `skip` entries of the scope
    async fn seek_start(
        &self,
        scope: &UtxoScope,
        filter: &UtxoFilter,
        skip: u64,
    ) -> IndexerResult<SeekOutcome> {
        let mut cursor: Option<UtxoCursor> = None;
        let mut remaining = skip;
        let mut chunks = 0_u64;

        while remaining > self.seek_chunk_size {
            match self.advance(scope, filter, cursor.as_ref(), self.seek_chunk_size).await? {
                Some(next) => cursor = Some(next),
                None => return Ok(SeekOutcome::Exhausted),
            }
            remaining -= self.seek_chunk_size;
            chunks += 1;
        }

        if remaining > 0 {
            match self.advance(scope, filter, cursor.as_ref(), remaining).await? {
                Some(next) => cursor = Some(next),
                None => return Ok(SeekOutcome::Exhausted),
            }
            chunks += 1;
        }

        if chunks > 1 {
            logging::log_debug(&format!(
                "Skipped {} entries in {} chunks for {:?}",
                skip, chunks, scope
            ));
        }

        Ok(SeekOutcome::Positioned(cursor))
    }

    /// Cursor after `count` more entries, or `None` when fewer remain
    async fn advance(
        &self,
        scope: &UtxoScope,
        filter: &UtxoFilter,
        cursor: Option<&UtxoCursor>,
        count: u64,
    ) -> IndexerResult<Option<UtxoCursor>> {
        let keys = self
            .utxo_repository
            .seek_keys(scope, filter, cursor, count)
            .await?;

        if (keys.len() as u64) < count {
            return Ok(None);
        }
        Ok(keys.into_iter().last())
    }
}
