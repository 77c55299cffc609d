mod common;

use rust_decimal::Decimal;

use asset_utxo_indexer::domain::errors::IndexerError;
use asset_utxo_indexer::infrastructure::persistence::repositories::transaction_log_repository::{
    ADDRESS_KIND_INPUT, ADDRESS_KIND_OWNER,
};

use common::*;

const ASSET_Z: &str = "5300000000000000000000000000000000000000000000000000000000000003";

async fn seed_history(ctx: &TestContext) {
    let log = &ctx.services.transaction_log;
    log.record_transaction(&mint(1, ASSET_X, 1, 1000, Some((100, 0))), None)
        .await
        .unwrap();
    log.record_transaction(&mint(2, ASSET_Y, 1, 70, Some((101, 0))), None)
        .await
        .unwrap();
    log.record_transaction(
        &transfer(
            3,
            &[Spend {
                source_seed: 1,
                index: 0,
                asset_type: ASSET_X,
                quantity: 1000,
            }],
            &[(2, ASSET_X, 400), (1, ASSET_X, 600)],
            Some((103, 0)),
        ),
        None,
    )
    .await
    .unwrap();
    log.record_transaction(&transfer(4, &[], &[(1, ASSET_X, 5)], None), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_asset_transactions_are_paged_newest_first() {
    let ctx = setup(110).await;
    seed_history(&ctx).await;
    let service = &ctx.services.utxo_service;

    assert_eq!(service.count_asset_transactions(ASSET_X).await.unwrap(), 3);
    assert_eq!(service.count_asset_transactions(ASSET_Y).await.unwrap(), 1);
    assert_eq!(service.count_asset_transactions(ASSET_Z).await.unwrap(), 0);

    let first = service
        .list_asset_transactions(ASSET_X, 1, 2)
        .await
        .unwrap();
    let hashes: Vec<String> = first.iter().map(|e| e.transaction_hash.clone()).collect();
    assert_eq!(hashes, vec![hash(4), hash(3)]);
    assert!(first[0].is_pending);
    assert_eq!(first[1].block_number, Some(103));
    assert_eq!(first[1].asset_type.as_deref(), Some(ASSET_X));

    let second = service
        .list_asset_transactions(&format!("0x{}", ASSET_X), 2, 2)
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].transaction_hash, hash(1));

    assert!(service
        .list_asset_transactions(ASSET_X, 3, 2)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_asset_transaction_listing_validates_paging() {
    let ctx = setup(110).await;
    let service = &ctx.services.utxo_service;

    for (page, items_per_page) in [(0, 10), (1, 0), (1, 100_001)] {
        let err = service
            .list_asset_transactions(ASSET_X, page, items_per_page)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexerError::Validation(_)));
    }

    assert!(matches!(
        service.list_asset_transactions("zz", 1, 10).await,
        Err(IndexerError::Validation(_))
    ));
    assert!(matches!(
        service.count_asset_transactions("zz").await,
        Err(IndexerError::Validation(_))
    ));
}

#[tokio::test]
async fn test_address_transactions_are_paged() {
    let ctx = setup(110).await;
    seed_history(&ctx).await;
    let service = &ctx.services.utxo_service;

    // Holder 2 only received outputs of the transfer
    let receiver = service
        .list_address_transactions(&address(2), 1, 10)
        .await
        .unwrap();
    assert_eq!(receiver.len(), 1);
    assert_eq!(receiver[0].entry.transaction_hash, hash(3));
    assert_eq!(receiver[0].kind, ADDRESS_KIND_OWNER);

    let sender = service
        .list_address_transactions(&address(1), 1, 100)
        .await
        .unwrap();
    assert_eq!(sender[0].entry.transaction_hash, hash(4));
    assert!(sender[0].entry.is_pending);
    assert!(sender
        .iter()
        .any(|a| a.entry.transaction_hash == hash(3) && a.kind == ADDRESS_KIND_INPUT));

    let paged: Vec<String> = {
        let mut hashes = Vec::new();
        for page in 1..=sender.len() as u64 {
            for activity in service
                .list_address_transactions(&address(1), page, 1)
                .await
                .unwrap()
            {
                hashes.push(activity.entry.transaction_hash);
            }
        }
        hashes
    };
    let all: Vec<String> = sender.iter().map(|a| a.entry.transaction_hash.clone()).collect();
    assert_eq!(paged, all);

    assert!(matches!(
        service.list_address_transactions("  ", 1, 10).await,
        Err(IndexerError::Validation(_))
    ));
}

#[tokio::test]
async fn test_get_asset_scheme() {
    let ctx = setup(110).await;
    seed_history(&ctx).await;
    let service = &ctx.services.utxo_service;

    let x = service
        .get_asset_scheme(&format!("0x{}", ASSET_X))
        .await
        .unwrap()
        .expect("scheme of X");
    assert_eq!(x.asset_type, ASSET_X);
    assert_eq!(x.supply, Decimal::from(1000));
    assert!(!x.is_pending);

    assert!(service.get_asset_scheme(ASSET_Z).await.unwrap().is_none());
    assert!(matches!(
        service.get_asset_scheme("zz").await,
        Err(IndexerError::Validation(_))
    ));

    ctx.services
        .transaction_log
        .record_transaction(&mint(5, ASSET_Z, 2, 3, None), None)
        .await
        .unwrap();
    let z = service
        .get_asset_scheme(ASSET_Z)
        .await
        .unwrap()
        .expect("pending scheme of Z");
    assert!(z.is_pending);
}
