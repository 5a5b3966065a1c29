use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_inventory_records_table::Migration),
            Box::new(m20240101_000002_create_inventory_lots_table::Migration),
            Box::new(m20240101_000003_create_inventory_movements_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_inventory_records_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_inventory_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryRecords::TenantId).uuid().not_null())
                        .col(
                            ColumnDef::new(InventoryRecords::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::ProductSku)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::ProductName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryRecords::VariantSku).string().null())
                        .col(
                            ColumnDef::new(InventoryRecords::TotalQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::AvailableQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::ReservedQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::CommittedQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::AverageCostPrice)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::LastCostPrice)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::ReorderPoint)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::MaxStockLevel)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryRecords::Warehouse).string().null())
                        .col(
                            ColumnDef::new(InventoryRecords::LowStockAlert)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::NearExpirationAlert)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::ExpiredAlert)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::OverstockAlert)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::CreatedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_records_tenant_sku")
                        .table(InventoryRecords::Table)
                        .col(InventoryRecords::TenantId)
                        .col(InventoryRecords::ProductSku)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_records_tenant_low_stock")
                        .table(InventoryRecords::Table)
                        .col(InventoryRecords::TenantId)
                        .col(InventoryRecords::LowStockAlert)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryRecords {
        Table,
        Id,
        TenantId,
        ProductId,
        ProductSku,
        ProductName,
        VariantSku,
        TotalQuantity,
        AvailableQuantity,
        ReservedQuantity,
        CommittedQuantity,
        AverageCostPrice,
        LastCostPrice,
        ReorderPoint,
        MaxStockLevel,
        Warehouse,
        LowStockAlert,
        NearExpirationAlert,
        ExpiredAlert,
        OverstockAlert,
        IsActive,
        Version,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_inventory_lots_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_inventory_lots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryLots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLots::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventoryLots::RecordId).uuid().not_null())
                        .col(ColumnDef::new(InventoryLots::TenantId).uuid().not_null())
                        .col(ColumnDef::new(InventoryLots::LotNumber).string().not_null())
                        .col(
                            ColumnDef::new(InventoryLots::Quantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::OriginalQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::AvailableQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::ReservedQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::CostPrice)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryLots::ReceivedDate).date().not_null())
                        .col(ColumnDef::new(InventoryLots::ExpirationDate).date().null())
                        .col(
                            ColumnDef::new(InventoryLots::ManufacturingDate)
                                .date()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryLots::SupplierId).uuid().null())
                        .col(ColumnDef::new(InventoryLots::Status).string().not_null())
                        .col(ColumnDef::new(InventoryLots::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(InventoryLots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_lots_record")
                                .from(InventoryLots::Table, InventoryLots::RecordId)
                                .to(
                                    super::m20240101_000001_create_inventory_records_table::InventoryRecords::Table,
                                    super::m20240101_000001_create_inventory_records_table::InventoryRecords::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_lots_record_lot_number")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::RecordId)
                        .col(InventoryLots::LotNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_lots_expiration")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::ExpirationDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryLots {
        Table,
        Id,
        RecordId,
        TenantId,
        LotNumber,
        Quantity,
        OriginalQuantity,
        AvailableQuantity,
        ReservedQuantity,
        CostPrice,
        ReceivedDate,
        ExpirationDate,
        ManufacturingDate,
        SupplierId,
        Status,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_inventory_movements_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_inventory_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::RecordId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::TenantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductSku)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::LotNumber).string().null())
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::UnitCost)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::TotalCost)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryMovements::Reason).string().not_null())
                        .col(ColumnDef::new(InventoryMovements::Reference).string().null())
                        .col(ColumnDef::new(InventoryMovements::OrderId).uuid().null())
                        .col(ColumnDef::new(InventoryMovements::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryMovements::BalanceTotal)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::BalanceAvailable)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::BalanceReserved)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::BalanceAverageCost)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ExpiresAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_movements_record")
                                .from(InventoryMovements::Table, InventoryMovements::RecordId)
                                .to(
                                    super::m20240101_000001_create_inventory_records_table::InventoryRecords::Table,
                                    super::m20240101_000001_create_inventory_records_table::InventoryRecords::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_record_id")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::RecordId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_tenant_order")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::TenantId)
                        .col(InventoryMovements::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_created_at")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryMovements {
        Table,
        Id,
        RecordId,
        TenantId,
        ProductId,
        ProductSku,
        LotNumber,
        MovementType,
        Quantity,
        UnitCost,
        TotalCost,
        Reason,
        Reference,
        OrderId,
        SupplierId,
        BalanceTotal,
        BalanceAvailable,
        BalanceReserved,
        BalanceAverageCost,
        ExpiresAt,
        CreatedBy,
        CreatedAt,
    }
}
