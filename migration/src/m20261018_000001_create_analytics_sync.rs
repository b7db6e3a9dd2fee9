use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only history of sync attempts, one row per attempt and feed type
        manager
            .create_table(
                Table::create()
                    .table(AnalyticsSync::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalyticsSync::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsSync::SyncType)
                            .string_len(60)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsSync::LastSync)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsSync::LastStatus)
                            .string_len(60)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalyticsSync::Log)
                            .text()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Both lookups filter by sync type and sort by last_sync
        manager
            .create_index(
                Index::create()
                    .name("idx_analytics_sync_type_last_sync")
                    .table(AnalyticsSync::Table)
                    .col(AnalyticsSync::SyncType)
                    .col(AnalyticsSync::LastSync)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnalyticsSync::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AnalyticsSync {
    Table,
    Id,
    SyncType,
    LastSync,
    LastStatus,
    Log,
}
