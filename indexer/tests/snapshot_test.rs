mod common;

use std::sync::Arc;
use std::time::Duration;

use asset_utxo_indexer::application::snapshot::SnapshotScheduler;
use asset_utxo_indexer::domain::errors::IndexerError;
use asset_utxo_indexer::domain::models::snapshot::snapshot_id;
use asset_utxo_indexer::domain::models::SnapshotStatus;

use common::*;

/// Mint at block 10, spend it at block 20
async fn seed_spent_mint(ctx: &TestContext) {
    let log = &ctx.services.transaction_log;
    log.record_transaction(&mint(1, ASSET_X, 1, 100, Some((10, 0))), None)
        .await
        .unwrap();
    log.record_transaction(
        &transfer(
            2,
            &[Spend {
                source_seed: 1,
                index: 0,
                asset_type: ASSET_X,
                quantity: 100,
            }],
            &[(2, ASSET_X, 40), (3, ASSET_X, 60)],
            Some((20, 0)),
        ),
        None,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_duplicate_requests_share_id_and_job() {
    let ctx = setup(30).await;
    let (scheduler, mut jobs) = SnapshotScheduler::new(
        ctx.repositories.snapshot.clone(),
        ctx.repositories.utxo.clone(),
        ctx.repositories.transaction_log.clone(),
        ctx.ledger.clone(),
    );

    let first = scheduler
        .request_snapshot(ASSET_X, &date_of_block(15))
        .await
        .unwrap();
    let second = scheduler
        .request_snapshot(&format!("0x{}", ASSET_X), &date_of_block(15))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, snapshot_id(ASSET_X, FakeLedgerHead::timestamp_of(15)));
    assert_eq!(jobs.try_recv().ok(), Some(first));
    assert!(jobs.try_recv().is_err());
    assert_eq!(scheduler.list_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_request_validation() {
    let ctx = setup(30).await;
    let snapshots = &ctx.services.snapshots;

    let future = snapshots
        .request_snapshot(ASSET_X, &date_of_block(31))
        .await
        .unwrap_err();
    assert!(matches!(future, IndexerError::Validation(_)));

    let bad_date = snapshots
        .request_snapshot(ASSET_X, "yesterday")
        .await
        .unwrap_err();
    assert!(matches!(bad_date, IndexerError::Validation(_)));

    let bad_asset = snapshots
        .request_snapshot("not-hex", &date_of_block(5))
        .await
        .unwrap_err();
    assert!(matches!(bad_asset, IndexerError::Validation(_)));

    assert!(snapshots.list_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_snapshot_is_not_found() {
    let ctx = setup(30).await;

    let err = ctx
        .services
        .utxo_service
        .get_snapshot("missing")
        .await
        .unwrap_err();

    assert!(matches!(err, IndexerError::NotFound(_)));
}

#[tokio::test]
async fn test_request_is_pending_until_resolved() {
    let ctx = setup(30).await;
    seed_spent_mint(&ctx).await;
    let snapshots = &ctx.services.snapshots;

    let id = snapshots
        .request_snapshot(ASSET_X, &date_of_block(15))
        .await
        .unwrap();
    let response = snapshots.get_snapshot(&id).await.unwrap();
    assert_eq!(response.request.status, SnapshotStatus::Pending);
    assert!(response.utxos.is_none());

    let listed = ctx
        .services
        .utxo_service
        .list_snapshot_requests()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].snapshot_id, id);

    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Ready);
    // Resolving again leaves the stored set alone
    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Ready);
}

#[tokio::test]
async fn test_snapshot_reflects_spends_by_height() {
    let ctx = setup(30).await;
    seed_spent_mint(&ctx).await;
    let snapshots = &ctx.services.snapshots;

    let before = snapshots
        .request_snapshot(ASSET_X, &date_of_block(15))
        .await
        .unwrap();
    snapshots.resolve(&before).await.unwrap();
    let response = snapshots.get_snapshot(&before).await.unwrap();
    assert_eq!(response.request.status, SnapshotStatus::Ready);
    assert_eq!(response.request.block_number, Some(15));
    let utxos = response.utxos.expect("materialized");
    assert_eq!(utxos.len(), 1);
    assert_eq!(utxos[0].transaction_hash, hash(1));

    let at_spend = snapshots
        .request_snapshot(ASSET_X, &date_of_block(20))
        .await
        .unwrap();
    snapshots.resolve(&at_spend).await.unwrap();
    let utxos = snapshots
        .get_snapshot(&at_spend)
        .await
        .unwrap()
        .utxos
        .expect("materialized");
    assert_eq!(utxos.len(), 2);
    assert!(utxos.iter().all(|u| u.transaction_hash == hash(2)));

    let other_asset = snapshots
        .request_snapshot(ASSET_Y, &date_of_block(20))
        .await
        .unwrap();
    snapshots.resolve(&other_asset).await.unwrap();
    let response = snapshots.get_snapshot(&other_asset).await.unwrap();
    assert_eq!(response.utxos, Some(Vec::new()));
}

#[tokio::test]
async fn test_request_waits_for_index_to_reach_target_block() {
    let ctx = setup(30).await;
    let log = &ctx.services.transaction_log;
    let snapshots = &ctx.services.snapshots;
    log.record_transaction(&mint(1, ASSET_X, 1, 100, Some((10, 0))), None)
        .await
        .unwrap();

    let id = snapshots
        .request_snapshot(ASSET_X, &date_of_block(20))
        .await
        .unwrap();
    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Pending);
    let response = snapshots.get_snapshot(&id).await.unwrap();
    assert_eq!(response.request.status, SnapshotStatus::Pending);
    assert!(response.utxos.is_none());

    // The spend at block 15 arrives after the request was made
    log.record_transaction(
        &transfer(
            2,
            &[Spend {
                source_seed: 1,
                index: 0,
                asset_type: ASSET_X,
                quantity: 100,
            }],
            &[(2, ASSET_X, 30), (3, ASSET_X, 70)],
            Some((15, 0)),
        ),
        None,
    )
    .await
    .unwrap();
    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Pending);

    log.record_transaction(&mint(3, ASSET_Y, 1, 5, Some((22, 0))), None)
        .await
        .unwrap();
    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Ready);

    let utxos = snapshots
        .get_snapshot(&id)
        .await
        .unwrap()
        .utxos
        .expect("materialized");
    assert_eq!(utxos.len(), 2);
    assert!(utxos.iter().all(|u| u.transaction_hash == hash(2)));
}

#[tokio::test]
async fn test_pending_transactions_do_not_advance_the_index() {
    let ctx = setup(30).await;
    let log = &ctx.services.transaction_log;
    let snapshots = &ctx.services.snapshots;
    log.record_transaction(&mint(1, ASSET_X, 1, 100, Some((10, 0))), None)
        .await
        .unwrap();
    log.record_transaction(&mint(2, ASSET_Y, 2, 50, None), None)
        .await
        .unwrap();

    let id = snapshots
        .request_snapshot(ASSET_X, &date_of_block(25))
        .await
        .unwrap();
    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Pending);

    log.finalize_transaction(&hash(2), 28, 0).await.unwrap();
    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Ready);
    let utxos = snapshots
        .get_snapshot(&id)
        .await
        .unwrap()
        .utxos
        .expect("materialized");
    assert_eq!(utxos.len(), 1);
    assert_eq!(utxos[0].transaction_hash, hash(1));
}

#[tokio::test]
async fn test_unreachable_ledger_leaves_request_pending() {
    let ctx = setup(30).await;
    seed_spent_mint(&ctx).await;
    let snapshots = &ctx.services.snapshots;

    let id = snapshots
        .request_snapshot(ASSET_X, &date_of_block(15))
        .await
        .unwrap();
    ctx.ledger.set_failing(true);

    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Pending);
    assert_eq!(snapshots.resolve_pending().await.unwrap(), 0);
    let response = snapshots.get_snapshot(&id).await.unwrap();
    assert_eq!(response.request.status, SnapshotStatus::Pending);

    ctx.ledger.set_failing(false);
    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Ready);
}

#[tokio::test]
async fn test_failed_request_is_requeued_when_requested_again() {
    let ctx = setup(30).await;
    seed_spent_mint(&ctx).await;
    let (scheduler, mut jobs) = SnapshotScheduler::new(
        ctx.repositories.snapshot.clone(),
        ctx.repositories.utxo.clone(),
        ctx.repositories.transaction_log.clone(),
        ctx.ledger.clone(),
    );

    let id = scheduler
        .request_snapshot(ASSET_X, &date_of_block(15))
        .await
        .unwrap();
    assert_eq!(jobs.try_recv().ok(), Some(id.clone()));
    assert!(ctx.repositories.snapshot.mark_failed(&id).await.unwrap());
    assert_eq!(scheduler.resolve(&id).await.unwrap(), SnapshotStatus::Failed);

    let again = scheduler
        .request_snapshot(ASSET_X, &date_of_block(15))
        .await
        .unwrap();
    assert_eq!(again, id);
    assert_eq!(jobs.try_recv().ok(), Some(id.clone()));
    assert_eq!(
        scheduler.get_snapshot(&id).await.unwrap().request.status,
        SnapshotStatus::Pending
    );

    assert_eq!(scheduler.resolve(&id).await.unwrap(), SnapshotStatus::Ready);
    // A ready request is not reset
    scheduler
        .request_snapshot(ASSET_X, &date_of_block(15))
        .await
        .unwrap();
    assert!(jobs.try_recv().is_err());
}

#[tokio::test]
async fn test_target_not_produced_stays_pending() {
    let ctx = setup(30).await;
    let snapshots = &ctx.services.snapshots;
    let target = FakeLedgerHead::timestamp_of(40);
    let id = snapshot_id(ASSET_X, target);

    assert!(ctx
        .repositories
        .snapshot
        .insert_if_absent(&id, ASSET_X, target)
        .await
        .unwrap());

    assert_eq!(snapshots.resolve(&id).await.unwrap(), SnapshotStatus::Pending);

    ctx.ledger.set_best(45);
    ctx.services
        .transaction_log
        .record_transaction(&mint(1, ASSET_X, 1, 10, Some((42, 0))), None)
        .await
        .unwrap();
    assert_eq!(snapshots.resolve_pending().await.unwrap(), 1);
    let response = snapshots.get_snapshot(&id).await.unwrap();
    assert_eq!(response.request.block_number, Some(40));
    assert_eq!(response.utxos, Some(Vec::new()));
}

#[tokio::test]
async fn test_worker_materializes_requests() {
    let mut ctx = setup(30).await;
    seed_spent_mint(&ctx).await;
    let worker = ctx.worker.take().expect("worker");
    let handle = tokio::spawn(worker.start());

    let service = Arc::clone(&ctx.services.utxo_service);
    let id = service
        .request_snapshot(ASSET_X, &date_of_block(20))
        .await
        .unwrap();

    let ready = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let response = service.get_snapshot(&id).await.unwrap();
            if response.request.status == SnapshotStatus::Ready {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("snapshot resolved in time");

    assert_eq!(ready.utxos.map(|utxos| utxos.len()), Some(2));
    handle.abort();
}
