//! SeaORM implementation of TimeSlotRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Condition;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::domain::{DomainResult, TimeSlot, TimeSlotRepository, TimeSlotStatus};
use crate::infrastructure::database::entities::time_slot;

pub struct SeaOrmTimeSlotRepository {
    db: DatabaseConnection,
}

impl SeaOrmTimeSlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Select the ids matching `condition`, then delete exactly those rows
    async fn delete_where(&self, condition: Condition) -> DomainResult<Vec<String>> {
        let txn = self.db.begin().await?;

        let ids: Vec<String> = time_slot::Entity::find()
            .select_only()
            .column(time_slot::Column::Id)
            .filter(condition)
            .into_tuple()
            .all(&txn)
            .await?;

        if !ids.is_empty() {
            time_slot::Entity::delete_many()
                .filter(time_slot::Column::Id.is_in(ids.clone()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        debug!(deleted = ids.len(), "Time slots deleted");
        Ok(ids)
    }
}

fn starting_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(time_slot::Column::StartTime.gte(from))
        .add(time_slot::Column::StartTime.lt(to))
}

fn model_to_domain(m: time_slot::Model) -> TimeSlot {
    TimeSlot {
        id: m.id,
        station_id: m.station_id,
        slot_id: m.slot_id,
        start_time: m.start_time,
        end_time: m.end_time,
        status: TimeSlotStatus::from_str(&m.status),
    }
}

#[async_trait]
impl TimeSlotRepository for SeaOrmTimeSlotRepository {
    async fn insert_many(&self, time_slots: Vec<TimeSlot>) -> DomainResult<()> {
        if time_slots.is_empty() {
            return Ok(());
        }

        let models = time_slots.into_iter().map(|ts| time_slot::ActiveModel {
            id: Set(ts.id),
            station_id: Set(ts.station_id),
            slot_id: Set(ts.slot_id),
            start_time: Set(ts.start_time),
            end_time: Set(ts.end_time),
            status: Set(ts.status.as_str().to_string()),
        });
        time_slot::Entity::insert_many(models).exec(&self.db).await?;
        Ok(())
    }

    async fn exists_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let count = time_slot::Entity::find()
            .filter(starting_between(from, to))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeSlot>> {
        let models = time_slot::Entity::find()
            .filter(starting_between(from, to))
            .order_by_asc(time_slot::Column::StartTime)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_for_slot_between(
        &self,
        station_id: &str,
        slot_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeSlot>> {
        let models = time_slot::Entity::find()
            .filter(time_slot::Column::StationId.eq(station_id))
            .filter(time_slot::Column::SlotId.eq(slot_id))
            .filter(starting_between(from, to))
            .order_by_asc(time_slot::Column::StartTime)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn delete_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<String>> {
        self.delete_where(starting_between(from, to)).await
    }

    async fn delete_starting_before(&self, before: DateTime<Utc>) -> DomainResult<Vec<String>> {
        self.delete_where(Condition::all().add(time_slot::Column::StartTime.lt(before)))
            .await
    }
}
