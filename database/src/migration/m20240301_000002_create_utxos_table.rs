use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Utxos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Utxos::TransactionHash).text().not_null())
                    .col(ColumnDef::new(Utxos::OutputIndex).integer().not_null())
                    .col(ColumnDef::new(Utxos::Tracker).text().not_null())
                    .col(ColumnDef::new(Utxos::Owner).text().null())
                    .col(ColumnDef::new(Utxos::AssetType).text().not_null())
                    .col(ColumnDef::new(Utxos::ShardId).integer().not_null())
                    .col(ColumnDef::new(Utxos::LockScriptHash).text().not_null())
                    .col(
                        ColumnDef::new(Utxos::Parameters)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Utxos::Quantity).text().not_null())
                    .col(ColumnDef::new(Utxos::BlockNumber).big_integer().null())
                    .col(ColumnDef::new(Utxos::TransactionIndex).integer().null())
                    .col(ColumnDef::new(Utxos::OrderBlock).big_integer().not_null())
                    .col(ColumnDef::new(Utxos::OrderIndex).big_integer().not_null())
                    .col(
                        ColumnDef::new(Utxos::IsSpent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Utxos::SpentBy).text().null())
                    .col(ColumnDef::new(Utxos::SpentBlockNumber).big_integer().null())
                    .primary_key(
                        Index::create()
                            .col(Utxos::TransactionHash)
                            .col(Utxos::OutputIndex),
                    )
                    .to_owned(),
            )
            .await?;

        // Seek order of asset-type listings
        manager
            .create_index(
                Index::create()
                    .name("utxos_asset_type_order")
                    .table(Utxos::Table)
                    .col(Utxos::AssetType)
                    .col((Utxos::OrderBlock, IndexOrder::Desc))
                    .col((Utxos::OrderIndex, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seek order of owner listings and aggregation
        manager
            .create_index(
                Index::create()
                    .name("utxos_owner_asset_type_order")
                    .table(Utxos::Table)
                    .col(Utxos::Owner)
                    .col(Utxos::AssetType)
                    .col((Utxos::OrderBlock, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Outpoint lookup when a transfer consumes its inputs
        manager
            .create_index(
                Index::create()
                    .name("utxos_tracker_output")
                    .table(Utxos::Table)
                    .col(Utxos::Tracker)
                    .col(Utxos::OutputIndex)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("utxos_spent_by")
                    .table(Utxos::Table)
                    .col(Utxos::SpentBy)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Utxos::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Utxos {
    Table,
    TransactionHash,
    OutputIndex,
    Tracker,
    Owner,
    AssetType,
    ShardId,
    LockScriptHash,
    Parameters,
    Quantity,
    BlockNumber,
    TransactionIndex,
    OrderBlock,
    OrderIndex,
    IsSpent,
    SpentBy,
    SpentBlockNumber,
}
