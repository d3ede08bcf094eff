use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PendingChanges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingChanges::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingChanges::ChangeType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingChanges::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(PendingChanges::ItemData).json().null())
                    .col(ColumnDef::new(PendingChanges::OriginalData).json().null())
                    .col(
                        ColumnDef::new(PendingChanges::RequestedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingChanges::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PendingChanges::ApprovedBy).string().null())
                    .col(
                        ColumnDef::new(PendingChanges::ApprovedAt)
                            .timestamp()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Review queue lists newest first, filtered by status
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_changes_created_status")
                    .table(PendingChanges::Table)
                    .col((PendingChanges::CreatedAt, IndexOrder::Desc))
                    .col(PendingChanges::Status)
                    .to_owned(),
            )
            .await?;

        // Reconciliation scans approved batch changes
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_changes_type_status")
                    .table(PendingChanges::Table)
                    .col(PendingChanges::ChangeType)
                    .col(PendingChanges::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PendingChanges::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PendingChanges {
    Table,
    Id,
    ChangeType,
    Status,
    ItemData,
    OriginalData,
    RequestedBy,
    CreatedAt,
    ApprovedBy,
    ApprovedAt,
}
