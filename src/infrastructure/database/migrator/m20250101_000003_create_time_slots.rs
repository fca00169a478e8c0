//! Create time_slots table

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_slots::Slots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TimeSlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimeSlots::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TimeSlots::StationId).string().not_null())
                    .col(ColumnDef::new(TimeSlots::SlotId).string().not_null())
                    .col(
                        ColumnDef::new(TimeSlots::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::Status)
                            .string()
                            .not_null()
                            .default("Available"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_time_slots_slot")
                            .from(TimeSlots::Table, TimeSlots::SlotId)
                            .to(Slots::Table, Slots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_slots_start")
                    .table(TimeSlots::Table)
                    .col(TimeSlots::StartTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_slots_slot_start")
                    .table(TimeSlots::Table)
                    .col(TimeSlots::SlotId)
                    .col(TimeSlots::StartTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TimeSlots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum TimeSlots {
    Table,
    Id,
    StationId,
    SlotId,
    StartTime,
    EndTime,
    Status,
}
