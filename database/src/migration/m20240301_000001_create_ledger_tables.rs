use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransactionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionLogs::TransactionHash)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TransactionLogs::Tracker).text().not_null())
                    .col(ColumnDef::new(TransactionLogs::TransactionType).text().not_null())
                    .col(ColumnDef::new(TransactionLogs::BlockNumber).big_integer().null())
                    .col(ColumnDef::new(TransactionLogs::TransactionIndex).integer().null())
                    .col(ColumnDef::new(TransactionLogs::IsPending).boolean().not_null())
                    .col(ColumnDef::new(TransactionLogs::AssetType).text().null())
                    .col(
                        ColumnDef::new(TransactionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("transaction_logs_asset_type")
                    .table(TransactionLogs::Table)
                    .col(TransactionLogs::AssetType)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddressLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AddressLogs::TransactionHash).text().not_null())
                    .col(ColumnDef::new(AddressLogs::Address).text().not_null())
                    .col(ColumnDef::new(AddressLogs::Kind).text().not_null())
                    .col(ColumnDef::new(AddressLogs::Tracker).text().not_null())
                    .col(ColumnDef::new(AddressLogs::TransactionType).text().not_null())
                    .col(ColumnDef::new(AddressLogs::BlockNumber).big_integer().null())
                    .col(ColumnDef::new(AddressLogs::TransactionIndex).integer().null())
                    .col(ColumnDef::new(AddressLogs::IsPending).boolean().not_null())
                    .primary_key(
                        Index::create()
                            .col(AddressLogs::TransactionHash)
                            .col(AddressLogs::Address)
                            .col(AddressLogs::Kind),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("address_logs_address_block")
                    .table(AddressLogs::Table)
                    .col(AddressLogs::Address)
                    .col((AddressLogs::BlockNumber, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AssetTypeLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AssetTypeLogs::TransactionHash).text().not_null())
                    .col(ColumnDef::new(AssetTypeLogs::AssetType).text().not_null())
                    .col(ColumnDef::new(AssetTypeLogs::Tracker).text().not_null())
                    .col(ColumnDef::new(AssetTypeLogs::TransactionType).text().not_null())
                    .col(ColumnDef::new(AssetTypeLogs::BlockNumber).big_integer().null())
                    .col(ColumnDef::new(AssetTypeLogs::TransactionIndex).integer().null())
                    .col(ColumnDef::new(AssetTypeLogs::IsPending).boolean().not_null())
                    .primary_key(
                        Index::create()
                            .col(AssetTypeLogs::TransactionHash)
                            .col(AssetTypeLogs::AssetType),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("asset_type_logs_asset_type_block")
                    .table(AssetTypeLogs::Table)
                    .col(AssetTypeLogs::AssetType)
                    .col((AssetTypeLogs::BlockNumber, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AssetSchemes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetSchemes::AssetType)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AssetSchemes::NetworkId).text().not_null())
                    .col(ColumnDef::new(AssetSchemes::ShardId).integer().not_null())
                    .col(ColumnDef::new(AssetSchemes::Metadata).text().not_null())
                    .col(ColumnDef::new(AssetSchemes::Approver).text().null())
                    .col(ColumnDef::new(AssetSchemes::Registrar).text().null())
                    .col(
                        ColumnDef::new(AssetSchemes::AllowedScriptHashes)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(AssetSchemes::Supply).text().not_null())
                    .col(ColumnDef::new(AssetSchemes::TransactionHash).text().not_null())
                    .col(ColumnDef::new(AssetSchemes::IsPending).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("asset_schemes_transaction_hash")
                    .table(AssetSchemes::Table)
                    .col(AssetSchemes::TransactionHash)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssetSchemes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssetTypeLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AddressLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionLogs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum TransactionLogs {
    Table,
    TransactionHash,
    Tracker,
    TransactionType,
    BlockNumber,
    TransactionIndex,
    IsPending,
    AssetType,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AddressLogs {
    Table,
    TransactionHash,
    Address,
    Kind,
    Tracker,
    TransactionType,
    BlockNumber,
    TransactionIndex,
    IsPending,
}

#[derive(Iden)]
enum AssetTypeLogs {
    Table,
    TransactionHash,
    AssetType,
    Tracker,
    TransactionType,
    BlockNumber,
    TransactionIndex,
    IsPending,
}

#[derive(Iden)]
enum AssetSchemes {
    Table,
    AssetType,
    NetworkId,
    ShardId,
    Metadata,
    Approver,
    Registrar,
    AllowedScriptHashes,
    Supply,
    TransactionHash,
    IsPending,
}
