//! SeaORM implementation of SlotRepository
//!
//! Claim and release are single `UPDATE … WHERE id = ? AND status = ?`
//! statements; `rows_affected` tells whether this caller won.

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, warn};

use crate::domain::{DomainError, DomainResult, Slot, SlotRepository, SlotStatus};
use crate::infrastructure::database::entities::slot;

pub struct SeaOrmSlotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn swap_status(&self, slot_id: &str, from: SlotStatus, to: SlotStatus) -> DomainResult<bool> {
        let result = slot::Entity::update_many()
            .col_expr(slot::Column::Status, Expr::value(to.as_str()))
            .filter(slot::Column::Id.eq(slot_id))
            .filter(slot::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn write_time_slot_ids(&self, slot_id: &str, ids: &[String]) -> DomainResult<()> {
        slot::Entity::update_many()
            .col_expr(slot::Column::TimeSlotIds, Expr::value(encode_ids(ids)?))
            .filter(slot::Column::Id.eq(slot_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn decode_ids(slot_id: &str, raw: &str) -> DomainResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| {
        warn!(slot_id, error = %e, "Stored time slot ids are unreadable");
        DomainError::Transient(format!(
            "Failed to decode time slot ids of slot {}: {}",
            slot_id, e
        ))
    })
}

fn encode_ids(ids: &[String]) -> DomainResult<String> {
    serde_json::to_string(ids)
        .map_err(|e| DomainError::Transient(format!("Failed to encode time slot ids: {}", e)))
}

fn model_to_domain(m: slot::Model) -> DomainResult<Slot> {
    Ok(Slot {
        time_slot_ids: decode_ids(&m.id, &m.time_slot_ids)?,
        id: m.id,
        station_id: m.station_id,
        connector_type: m.connector_type,
        status: SlotStatus::from_str(&m.status),
        active_from: m.active_from,
        active_until: m.active_until,
    })
}

// ── SlotRepository impl ─────────────────────────────────────────

#[async_trait]
impl SlotRepository for SeaOrmSlotRepository {
    async fn save(&self, s: Slot) -> DomainResult<()> {
        debug!(slot_id = %s.id, station_id = %s.station_id, "Saving slot");

        let model = slot::ActiveModel {
            time_slot_ids: Set(encode_ids(&s.time_slot_ids)?),
            id: Set(s.id),
            station_id: Set(s.station_id),
            connector_type: Set(s.connector_type),
            status: Set(s.status.as_str().to_string()),
            active_from: Set(s.active_from),
            active_until: Set(s.active_until),
        };
        slot::Entity::insert(model)
            .on_conflict(
                OnConflict::column(slot::Column::Id)
                    .update_columns([
                        slot::Column::StationId,
                        slot::Column::ConnectorType,
                        slot::Column::Status,
                        slot::Column::ActiveFrom,
                        slot::Column::ActiveUntil,
                        slot::Column::TimeSlotIds,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Slot>> {
        let model = slot::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        model.map(model_to_domain).transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .order_by_asc(slot::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_for_station(&self, station_id: &str) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .filter(slot::Column::StationId.eq(station_id))
            .order_by_asc(slot::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn count_for_station(&self, station_id: &str) -> DomainResult<u64> {
        let count = slot::Entity::find()
            .filter(slot::Column::StationId.eq(station_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn find_available(
        &self,
        station_id: &str,
        connector_type: &str,
    ) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .filter(slot::Column::StationId.eq(station_id))
            .filter(slot::Column::ConnectorType.eq(connector_type))
            .filter(slot::Column::Status.eq(SlotStatus::Available.as_str()))
            .order_by_asc(slot::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn try_claim(&self, slot_id: &str) -> DomainResult<bool> {
        self.swap_status(slot_id, SlotStatus::Available, SlotStatus::Booked)
            .await
    }

    async fn release(&self, slot_id: &str) -> DomainResult<bool> {
        self.swap_status(slot_id, SlotStatus::Booked, SlotStatus::Available)
            .await
    }

    async fn append_time_slots(
        &self,
        slot_id: &str,
        time_slot_ids: &[String],
    ) -> DomainResult<()> {
        let Some(model) = slot::Entity::find_by_id(slot_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(());
        };

        let mut ids = decode_ids(&model.id, &model.time_slot_ids)?;
        ids.extend_from_slice(time_slot_ids);
        self.write_time_slot_ids(slot_id, &ids).await
    }

    async fn detach_time_slots(&self, time_slot_ids: &[String]) -> DomainResult<()> {
        let gone: HashSet<&str> = time_slot_ids.iter().map(String::as_str).collect();
        let models = slot::Entity::find().all(&self.db).await?;

        for model in models {
            // an unreadable list is left for an operator to repair
            let Ok(ids) = decode_ids(&model.id, &model.time_slot_ids) else {
                continue;
            };
            let kept: Vec<String> = ids
                .iter()
                .filter(|id| !gone.contains(id.as_str()))
                .cloned()
                .collect();
            if kept.len() != ids.len() {
                self.write_time_slot_ids(&model.id, &kept).await?;
            }
        }
        Ok(())
    }
}
