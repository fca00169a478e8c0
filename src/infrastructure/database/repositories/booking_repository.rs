//! SeaORM implementation of BookingRepository
//!
//! Every status-sensitive write carries the expected status in its WHERE
//! clause and reports success through `rows_affected`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use crate::domain::{Booking, BookingRepository, BookingStatus, DomainResult};
use crate::infrastructure::database::entities::booking;

const ACTIVE: [&str; 2] = ["Pending", "Approved"];

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: booking::Model) -> Booking {
    Booking {
        id: m.id,
        station_id: m.station_id,
        slot_id: m.slot_id,
        owner_id: m.owner_id,
        status: BookingStatus::from_str(&m.status),
        start_time: m.start_time,
        end_time: m.end_time,
        created_at: m.created_at,
        updated_at: m.updated_at,
        qr_token: m.qr_token,
        qr_expires_at: m.qr_expires_at,
    }
}

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn insert(&self, b: Booking) -> DomainResult<()> {
        debug!(booking_id = %b.id, slot_id = %b.slot_id, "Inserting booking");

        let model = booking::ActiveModel {
            id: Set(b.id),
            station_id: Set(b.station_id),
            slot_id: Set(b.slot_id),
            owner_id: Set(b.owner_id),
            status: Set(b.status.as_str().to_string()),
            start_time: Set(b.start_time),
            end_time: Set(b.end_time),
            created_at: Set(b.created_at),
            updated_at: Set(b.updated_at),
            qr_token: Set(b.qr_token),
            qr_expires_at: Set(b.qr_expires_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_for_owner(&self, owner_id: &str) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::OwnerId.eq(owner_id))
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_for_station(&self, station_id: &str) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::StationId.eq(station_id))
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(next.as_str()))
            .col_expr(booking::Column::UpdatedAt, Expr::value(at))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(expected.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn reschedule(
        &self,
        id: &str,
        expected_start: DateTime<Utc>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        qr_expires_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = booking::Entity::update_many()
            .col_expr(booking::Column::StartTime, Expr::value(start_time))
            .col_expr(booking::Column::EndTime, Expr::value(end_time))
            .col_expr(booking::Column::QrExpiresAt, Expr::value(qr_expires_at))
            .col_expr(booking::Column::UpdatedAt, Expr::value(at))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.is_in(ACTIVE))
            .filter(booking::Column::StartTime.eq(expected_start))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn set_qr_token(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = booking::Entity::update_many()
            .col_expr(booking::Column::QrToken, Expr::value(token))
            .col_expr(booking::Column::QrExpiresAt, Expr::value(expires_at))
            .col_expr(booking::Column::UpdatedAt, Expr::value(at))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.is_in(ACTIVE))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn count_by_status(&self, status: BookingStatus) -> DomainResult<u64> {
        let count = booking::Entity::find()
            .filter(booking::Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_approved_starting_after(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let count = booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Approved.as_str()))
            .filter(booking::Column::StartTime.gt(now))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}
