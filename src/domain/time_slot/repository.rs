//! Time slot repository interface
//!
//! Ranges are half-open `[from, to)` over `start_time`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::TimeSlot;
use crate::domain::DomainResult;

#[async_trait]
pub trait TimeSlotRepository: Send + Sync {
    async fn insert_many(&self, time_slots: Vec<TimeSlot>) -> DomainResult<()>;

    /// Whether any time slot starts inside the range
    async fn exists_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// All time slots starting inside the range, ordered by start time
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeSlot>>;

    /// Windows of one slot starting inside the range, ordered by start time
    async fn find_for_slot_between(
        &self,
        station_id: &str,
        slot_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeSlot>>;

    /// Delete time slots starting inside the range; returns the deleted ids
    async fn delete_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<String>>;

    /// Delete time slots starting before the instant; returns the deleted ids
    async fn delete_starting_before(&self, before: DateTime<Utc>) -> DomainResult<Vec<String>>;
}
