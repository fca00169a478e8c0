//! Create slots table
//!
//! `status` is the allocation flag claimed with a conditional update.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_stations::Stations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Slots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Slots::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Slots::StationId).string().not_null())
                    .col(ColumnDef::new(Slots::ConnectorType).string().not_null())
                    .col(
                        ColumnDef::new(Slots::Status)
                            .string()
                            .not_null()
                            .default("Available"),
                    )
                    .col(ColumnDef::new(Slots::ActiveFrom).timestamp_with_time_zone())
                    .col(ColumnDef::new(Slots::ActiveUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Slots::TimeSlotIds)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_slots_station")
                            .from(Slots::Table, Slots::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_slots_station_connector_status")
                    .table(Slots::Table)
                    .col(Slots::StationId)
                    .col(Slots::ConnectorType)
                    .col(Slots::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Slots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Slots {
    Table,
    Id,
    StationId,
    ConnectorType,
    Status,
    ActiveFrom,
    ActiveUntil,
    TimeSlotIds,
}
