use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::PartNumber)
                            .string()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::MfgPartNumber)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::Qty)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::PartDescription)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryItems::Supplier).string().null())
                    .col(ColumnDef::new(InventoryItems::Location).string().null())
                    .col(ColumnDef::new(InventoryItems::Package).string().null())
                    .col(
                        ColumnDef::new(InventoryItems::ReorderPoint)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Dashboard filters the parts list by supplier
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_supplier")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::Supplier)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InventoryItems {
    Table,
    PartNumber,
    MfgPartNumber,
    Qty,
    PartDescription,
    Supplier,
    Location,
    Package,
    ReorderPoint,
    CreatedAt,
    UpdatedAt,
}
