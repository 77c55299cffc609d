use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SnapshotRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SnapshotRequests::SnapshotId)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SnapshotRequests::AssetType).text().not_null())
                    .col(
                        ColumnDef::new(SnapshotRequests::TargetTimestamp)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SnapshotRequests::BlockNumber).big_integer().null())
                    .col(
                        ColumnDef::new(SnapshotRequests::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(SnapshotRequests::Utxos).json_binary().null())
                    .col(
                        ColumnDef::new(SnapshotRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SnapshotRequests::UpdatedAt)
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
                    .name("snapshot_requests_status")
                    .table(SnapshotRequests::Table)
                    .col(SnapshotRequests::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SnapshotRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SnapshotRequests {
    Table,
    SnapshotId,
    AssetType,
    TargetTimestamp,
    BlockNumber,
    Status,
    Utxos,
    CreatedAt,
    UpdatedAt,
}
