use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_room_types_table::Migration),
            Box::new(m20240101_000002_create_inventory_data_table::Migration),
            Box::new(m20240101_000003_create_weekly_statistics_table::Migration),
            Box::new(m20240101_000004_create_snapshot_tables::Migration),
            Box::new(m20240101_000005_create_api_calls_table::Migration),
        ]
    }
}

mod m20240101_000001_create_room_types_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_room_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RoomTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RoomTypes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(RoomTypes::InvTypeCode).string_len(50).not_null())
                        .col(ColumnDef::new(RoomTypes::HotelId).string_len(20).not_null())
                        .col(ColumnDef::new(RoomTypes::Name).string_len(100).not_null())
                        .col(
                            ColumnDef::new(RoomTypes::TotalRooms)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RoomTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RoomTypes::UpdatedAt)
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
                        .name("uq_room_types_code_hotel")
                        .table(RoomTypes::Table)
                        .col(RoomTypes::InvTypeCode)
                        .col(RoomTypes::HotelId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RoomTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RoomTypes {
        Table,
        Id,
        InvTypeCode,
        HotelId,
        Name,
        TotalRooms,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_inventory_data_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_inventory_data_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryData::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryData::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryData::InvTypeCode)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryData::HotelId).string_len(20).not_null())
                        .col(ColumnDef::new(InventoryData::Date).date().not_null())
                        .col(ColumnDef::new(InventoryData::Quantity).integer().not_null())
                        .col(ColumnDef::new(InventoryData::Status).string_len(20).not_null())
                        .to_owned(),
                )
                .await?;

            // Upsert target for fetched days
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_inventory_data_code_date_hotel")
                        .table(InventoryData::Table)
                        .col(InventoryData::InvTypeCode)
                        .col(InventoryData::Date)
                        .col(InventoryData::HotelId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_data_date")
                        .table(InventoryData::Table)
                        .col(InventoryData::Date)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryData::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryData {
        Table,
        Id,
        InvTypeCode,
        HotelId,
        Date,
        Quantity,
        Status,
    }
}

mod m20240101_000003_create_weekly_statistics_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_weekly_statistics_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WeeklyStatistics::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WeeklyStatistics::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatistics::InvTypeCode)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatistics::HotelId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(WeeklyStatistics::WeekStartDate).date().not_null())
                        .col(ColumnDef::new(WeeklyStatistics::WeekEndDate).date().not_null())
                        .col(
                            ColumnDef::new(WeeklyStatistics::ActualOccupancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatistics::ActualVacancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatistics::TotalOccupancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatistics::TotalVacancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WeeklyStatistics::TotalRooms).integer().not_null())
                        .col(
                            ColumnDef::new(WeeklyStatistics::TotalAvailableDays)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatistics::TotalDays)
                                .integer()
                                .not_null()
                                .default(7),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_weekly_statistics_code_week_hotel")
                        .table(WeeklyStatistics::Table)
                        .col(WeeklyStatistics::InvTypeCode)
                        .col(WeeklyStatistics::WeekStartDate)
                        .col(WeeklyStatistics::HotelId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WeeklyStatistics::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum WeeklyStatistics {
        Table,
        Id,
        InvTypeCode,
        HotelId,
        WeekStartDate,
        WeekEndDate,
        ActualOccupancyRate,
        ActualVacancyRate,
        TotalOccupancyRate,
        TotalVacancyRate,
        TotalRooms,
        TotalAvailableDays,
        TotalDays,
    }
}

mod m20240101_000004_create_snapshot_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_snapshot_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DataSnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DataSnapshots::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DataSnapshots::SnapshotDate)
                                .date()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DataSnapshots::SnapshotTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DataSnapshots::Description).text().null())
                        .col(
                            ColumnDef::new(DataSnapshots::Status)
                                .string_len(20)
                                .not_null()
                                .default("processing"),
                        )
                        .col(
                            ColumnDef::new(DataSnapshots::TotalRecords)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DataSnapshots::CreatedBy)
                                .string_len(50)
                                .not_null()
                                .default("system"),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventorySnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventorySnapshots::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::SnapshotId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::InvTypeCode)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::HotelId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventorySnapshots::Date).date().not_null())
                        .col(ColumnDef::new(InventorySnapshots::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(InventorySnapshots::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_snapshots_snapshot_id")
                                .from(InventorySnapshots::Table, InventorySnapshots::SnapshotId)
                                .to(DataSnapshots::Table, DataSnapshots::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_snapshots_snapshot_id")
                        .table(InventorySnapshots::Table)
                        .col(InventorySnapshots::SnapshotId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WeeklyStatisticsSnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::SnapshotId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::InvTypeCode)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::HotelId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::WeekStartDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::WeekEndDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::ActualOccupancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::ActualVacancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::TotalOccupancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::TotalVacancyRate)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::TotalRooms)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::TotalAvailableDays)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WeeklyStatisticsSnapshots::TotalDays)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_weekly_statistics_snapshots_snapshot_id")
                                .from(
                                    WeeklyStatisticsSnapshots::Table,
                                    WeeklyStatisticsSnapshots::SnapshotId,
                                )
                                .to(DataSnapshots::Table, DataSnapshots::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_weekly_statistics_snapshots_snapshot_id")
                        .table(WeeklyStatisticsSnapshots::Table)
                        .col(WeeklyStatisticsSnapshots::SnapshotId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(WeeklyStatisticsSnapshots::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(InventorySnapshots::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DataSnapshots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DataSnapshots {
        Table,
        Id,
        SnapshotDate,
        SnapshotTime,
        Description,
        Status,
        TotalRecords,
        CreatedBy,
    }

    #[derive(DeriveIden)]
    enum InventorySnapshots {
        Table,
        Id,
        SnapshotId,
        InvTypeCode,
        HotelId,
        Date,
        Quantity,
        Status,
    }

    #[derive(DeriveIden)]
    enum WeeklyStatisticsSnapshots {
        Table,
        Id,
        SnapshotId,
        InvTypeCode,
        HotelId,
        WeekStartDate,
        WeekEndDate,
        ActualOccupancyRate,
        ActualVacancyRate,
        TotalOccupancyRate,
        TotalVacancyRate,
        TotalRooms,
        TotalAvailableDays,
        TotalDays,
    }
}

mod m20240101_000005_create_api_calls_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_api_calls_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ApiCalls::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ApiCalls::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ApiCalls::StartDate).date().not_null())
                        .col(ColumnDef::new(ApiCalls::EndDate).date().not_null())
                        .col(ColumnDef::new(ApiCalls::InvTypeCode).string_len(100).not_null())
                        .col(ColumnDef::new(ApiCalls::Success).boolean().not_null())
                        .col(ColumnDef::new(ApiCalls::ErrorMessage).text().null())
                        .col(
                            ColumnDef::new(ApiCalls::CalledAt)
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
                        .name("idx_api_calls_called_at")
                        .table(ApiCalls::Table)
                        .col(ApiCalls::CalledAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ApiCalls::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ApiCalls {
        Table,
        Id,
        StartDate,
        EndDate,
        InvTypeCode,
        Success,
        ErrorMessage,
        CalledAt,
    }
}
