//! Slot repository interface

use async_trait::async_trait;

use super::model::Slot;
use crate::domain::DomainResult;

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Insert or replace a slot record
    async fn save(&self, slot: Slot) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Slot>>;

    /// All slots, ordered by id
    async fn find_all(&self) -> DomainResult<Vec<Slot>>;

    /// All slots of a station, ordered by id
    async fn find_for_station(&self, station_id: &str) -> DomainResult<Vec<Slot>>;

    /// Number of slot records registered for a station, any status
    async fn count_for_station(&self, station_id: &str) -> DomainResult<u64>;

    /// Available slots matching station and connector type, ordered by id
    async fn find_available(
        &self,
        station_id: &str,
        connector_type: &str,
    ) -> DomainResult<Vec<Slot>>;

    /// Atomically flip Available -> Booked. Returns false if the slot was
    /// not Available at the moment of the write.
    async fn try_claim(&self, slot_id: &str) -> DomainResult<bool>;

    /// Atomically flip Booked -> Available. Returns false if the slot was
    /// not Booked.
    async fn release(&self, slot_id: &str) -> DomainResult<bool>;

    /// Append generated time slot ids to the slot's reference list
    async fn append_time_slots(&self, slot_id: &str, time_slot_ids: &[String])
        -> DomainResult<()>;

    /// Remove the given time slot ids from every slot's reference list
    async fn detach_time_slots(&self, time_slot_ids: &[String]) -> DomainResult<()>;
}
