#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema};

use asset_utxo_indexer::application::Services;
use asset_utxo_indexer::application::snapshot::SnapshotWorker;
use asset_utxo_indexer::config::{AppConfig, DatabaseConfig, LedgerConfig, QueryConfig, SnapshotConfig};
use asset_utxo_indexer::domain::models::transaction::{
    AssetMintOutput, AssetOutPoint, AssetTransferInput, AssetTransferOutput, IncreaseAssetSupply,
    MintAsset, TransferAsset,
};
use asset_utxo_indexer::domain::models::{LedgerTransaction, TransactionAction};
use asset_utxo_indexer::domain::services::address_resolver::P2PKH_LOCK_SCRIPT_HASH;
use asset_utxo_indexer::domain::services::{AddressResolver, StandardAddressResolver};
use asset_utxo_indexer::infrastructure::ledger::{LedgerError, LedgerHead};
use asset_utxo_indexer::infrastructure::persistence::entities::{
    address_logs, asset_schemes, asset_type_logs, snapshot_requests, transaction_logs, utxos,
};
use asset_utxo_indexer::infrastructure::persistence::{RepositoryFactory, Repositories};

pub const NETWORK: &str = "tc";
pub const ASSET_X: &str = "5300000000000000000000000000000000000000000000000000000000000001";
pub const ASSET_Y: &str = "5300000000000000000000000000000000000000000000000000000000000002";
/// Timestamp of block 0; every later block is `BLOCK_INTERVAL` seconds apart
pub const BASE_TIMESTAMP: i64 = 1_556_668_800;
pub const BLOCK_INTERVAL: i64 = 10;

/// Ledger head with a settable best block and evenly spaced block times
#[derive(Debug)]
pub struct FakeLedgerHead {
    best: AtomicI64,
    failing: AtomicBool,
}

impl FakeLedgerHead {
    pub fn new(best: i64) -> Self {
        Self {
            best: AtomicI64::new(best),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_best(&self, best: i64) {
        self.best.store(best, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn timestamp_of(block_number: i64) -> i64 {
        BASE_TIMESTAMP + block_number * BLOCK_INTERVAL
    }
}

#[async_trait]
impl LedgerHead for FakeLedgerHead {
    async fn get_best_block_number(&self) -> Result<i64, LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::NetworkError("node unreachable".to_string()));
        }
        Ok(self.best.load(Ordering::SeqCst))
    }

    async fn get_block_timestamp(&self, block_number: i64) -> Result<i64, LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::NetworkError("node unreachable".to_string()));
        }
        if block_number < 0 || block_number > self.best.load(Ordering::SeqCst) {
            return Err(LedgerError::BlockNotFound(block_number));
        }
        Ok(Self::timestamp_of(block_number))
    }
}

/// Everything a test needs: an in-memory database with the full schema,
/// a fake ledger and the wired services
pub struct TestContext {
    pub db: DatabaseConnection,
    pub ledger: Arc<FakeLedgerHead>,
    pub repositories: Repositories,
    pub services: Services,
    pub worker: Option<SnapshotWorker>,
}

pub fn test_config(seek_chunk_size: u64) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        ledger: LedgerConfig {
            rpc_url: "http://localhost:8080".to_string(),
        },
        query: QueryConfig {
            seek_chunk_size,
            ..QueryConfig::default()
        },
        snapshot: SnapshotConfig {
            sweep_interval_ms: 50,
        },
    }
}

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    // One connection: every pooled connection to `:memory:` is its own database
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory database");

    let schema = Schema::new(DbBackend::Sqlite);
    let statements = [
        schema.create_table_from_entity(transaction_logs::Entity),
        schema.create_table_from_entity(utxos::Entity),
        schema.create_table_from_entity(address_logs::Entity),
        schema.create_table_from_entity(asset_type_logs::Entity),
        schema.create_table_from_entity(asset_schemes::Entity),
        schema.create_table_from_entity(snapshot_requests::Entity),
    ];
    for statement in statements.iter() {
        db.execute(db.get_database_backend().build(statement))
            .await
            .expect("failed to create table");
    }

    db
}

pub async fn setup(best_block_number: i64) -> TestContext {
    setup_with_chunk(best_block_number, QueryConfig::default().seek_chunk_size).await
}

pub async fn setup_with_chunk(best_block_number: i64, seek_chunk_size: u64) -> TestContext {
    let db = setup_db().await;
    let ledger = Arc::new(FakeLedgerHead::new(best_block_number));
    let config = test_config(seek_chunk_size);
    let (services, worker) = Services::build(db.clone(), ledger.clone(), &config);

    TestContext {
        repositories: RepositoryFactory::from_connection(db.clone()),
        db,
        ledger,
        services,
        worker: Some(worker),
    }
}

pub fn hash(seed: u64) -> String {
    format!("{:064x}", seed)
}

pub fn tracker(seed: u64) -> String {
    format!("{:064x}", seed + (1 << 40))
}

pub fn pubkey_hash(holder: u8) -> String {
    format!("{:040x}", u64::from(holder) + 1)
}

/// Address the standard resolver assigns to `holder`
pub fn address(holder: u8) -> String {
    StandardAddressResolver
        .get_owner(P2PKH_LOCK_SCRIPT_HASH, &[pubkey_hash(holder)], NETWORK)
        .expect("standard lock script resolves")
}

pub fn date_of_block(block_number: i64) -> String {
    Utc.timestamp_opt(FakeLedgerHead::timestamp_of(block_number), 0)
        .single()
        .expect("valid timestamp")
        .to_rfc3339()
}

fn base(seed: u64, position: Option<(i64, i32)>, action: TransactionAction) -> LedgerTransaction {
    LedgerTransaction {
        hash: hash(seed),
        tracker: tracker(seed),
        network_id: NETWORK.to_string(),
        block_number: position.map(|(block, _)| block),
        transaction_index: position.map(|(_, index)| index),
        action,
    }
}

pub fn mint(
    seed: u64,
    asset_type: &str,
    holder: u8,
    supply: i64,
    position: Option<(i64, i32)>,
) -> LedgerTransaction {
    base(
        seed,
        position,
        TransactionAction::MintAsset(MintAsset {
            shard_id: 0,
            asset_type: asset_type.to_string(),
            metadata: format!("{{\"name\":\"asset {}\"}}", seed),
            approver: None,
            registrar: None,
            allowed_script_hashes: Vec::new(),
            output: AssetMintOutput {
                lock_script_hash: P2PKH_LOCK_SCRIPT_HASH.to_string(),
                parameters: vec![pubkey_hash(holder)],
                supply: Decimal::from(supply),
            },
        }),
    )
}

pub fn increase_supply(
    seed: u64,
    asset_type: &str,
    holder: u8,
    amount: i64,
    position: Option<(i64, i32)>,
) -> LedgerTransaction {
    base(
        seed,
        position,
        TransactionAction::IncreaseAssetSupply(IncreaseAssetSupply {
            shard_id: 0,
            asset_type: asset_type.to_string(),
            seq: 0,
            output: AssetMintOutput {
                lock_script_hash: P2PKH_LOCK_SCRIPT_HASH.to_string(),
                parameters: vec![pubkey_hash(holder)],
                supply: Decimal::from(amount),
            },
        }),
    )
}

/// Input spending output `index` of the transaction built from `source_seed`
pub struct Spend {
    pub source_seed: u64,
    pub index: u32,
    pub asset_type: &'static str,
    pub quantity: i64,
}

pub fn transfer(
    seed: u64,
    inputs: &[Spend],
    outputs: &[(u8, &str, i64)],
    position: Option<(i64, i32)>,
) -> LedgerTransaction {
    base(
        seed,
        position,
        TransactionAction::TransferAsset(TransferAsset {
            inputs: inputs
                .iter()
                .map(|spend| AssetTransferInput {
                    prev_out: AssetOutPoint {
                        tracker: tracker(spend.source_seed),
                        index: spend.index,
                        asset_type: spend.asset_type.to_string(),
                        shard_id: 0,
                        quantity: Decimal::from(spend.quantity),
                    },
                })
                .collect(),
            burns: Vec::new(),
            outputs: outputs
                .iter()
                .map(|(holder, asset_type, quantity)| AssetTransferOutput {
                    lock_script_hash: P2PKH_LOCK_SCRIPT_HASH.to_string(),
                    parameters: vec![pubkey_hash(*holder)],
                    asset_type: asset_type.to_string(),
                    shard_id: 0,
                    quantity: Decimal::from(*quantity),
                })
                .collect(),
        }),
    )
}
