//! In-memory repositories
//!
//! Conditional writes (slot claim/release, booking status CAS) happen under
//! the DashMap shard lock held by `get_mut`, which makes them atomic with
//! respect to every other writer of the same key.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::{
    Booking, BookingRepository, BookingStatus, DomainResult, RepositoryProvider, Slot,
    SlotRepository, SlotStatus, Station, StationRepository, TimeSlot, TimeSlotRepository,
};

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    stations: InMemoryStationRepository,
    slots: InMemorySlotRepository,
    time_slots: InMemoryTimeSlotRepository,
    bookings: InMemoryBookingRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn stations(&self) -> &dyn StationRepository {
        &self.stations
    }

    fn slots(&self) -> &dyn SlotRepository {
        &self.slots
    }

    fn time_slots(&self) -> &dyn TimeSlotRepository {
        &self.time_slots
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }
}

// ── Stations ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryStationRepository {
    stations: DashMap<String, Station>,
}

#[async_trait]
impl StationRepository for InMemoryStationRepository {
    async fn save(&self, station: Station) -> DomainResult<()> {
        self.stations.insert(station.id.clone(), station);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>> {
        Ok(self.stations.get(id).map(|s| s.clone()))
    }
}

// ── Slots ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: DashMap<String, Slot>,
}

impl InMemorySlotRepository {
    fn sorted(&self, filter: impl Fn(&Slot) -> bool) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .slots
            .iter()
            .filter(|e| filter(e.value()))
            .map(|e| e.value().clone())
            .collect();
        slots.sort_by(|a, b| a.id.cmp(&b.id));
        slots
    }

    fn swap_status(&self, slot_id: &str, from: SlotStatus, to: SlotStatus) -> bool {
        match self.slots.get_mut(slot_id) {
            Some(mut slot) if slot.status == from => {
                slot.status = to;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn save(&self, slot: Slot) -> DomainResult<()> {
        self.slots.insert(slot.id.clone(), slot);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Slot>> {
        Ok(self.slots.get(id).map(|s| s.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Slot>> {
        Ok(self.sorted(|_| true))
    }

    async fn find_for_station(&self, station_id: &str) -> DomainResult<Vec<Slot>> {
        Ok(self.sorted(|s| s.station_id == station_id))
    }

    async fn count_for_station(&self, station_id: &str) -> DomainResult<u64> {
        Ok(self
            .slots
            .iter()
            .filter(|e| e.station_id == station_id)
            .count() as u64)
    }

    async fn find_available(
        &self,
        station_id: &str,
        connector_type: &str,
    ) -> DomainResult<Vec<Slot>> {
        Ok(self.sorted(|s| {
            s.station_id == station_id && s.connector_type == connector_type && s.is_available()
        }))
    }

    async fn try_claim(&self, slot_id: &str) -> DomainResult<bool> {
        Ok(self.swap_status(slot_id, SlotStatus::Available, SlotStatus::Booked))
    }

    async fn release(&self, slot_id: &str) -> DomainResult<bool> {
        Ok(self.swap_status(slot_id, SlotStatus::Booked, SlotStatus::Available))
    }

    async fn append_time_slots(
        &self,
        slot_id: &str,
        time_slot_ids: &[String],
    ) -> DomainResult<()> {
        if let Some(mut slot) = self.slots.get_mut(slot_id) {
            slot.time_slot_ids.extend_from_slice(time_slot_ids);
        }
        Ok(())
    }

    async fn detach_time_slots(&self, time_slot_ids: &[String]) -> DomainResult<()> {
        let gone: HashSet<&str> = time_slot_ids.iter().map(String::as_str).collect();
        for mut slot in self.slots.iter_mut() {
            slot.time_slot_ids.retain(|id| !gone.contains(id.as_str()));
        }
        Ok(())
    }
}

// ── Time slots ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTimeSlotRepository {
    time_slots: DashMap<String, TimeSlot>,
}

impl InMemoryTimeSlotRepository {
    fn remove_where(&self, predicate: impl Fn(&TimeSlot) -> bool) -> Vec<String> {
        let ids: Vec<String> = self
            .time_slots
            .iter()
            .filter(|e| predicate(e.value()))
            .map(|e| e.key().clone())
            .collect();
        ids.into_iter()
            .filter(|id| self.time_slots.remove(id).is_some())
            .collect()
    }
}

fn starts_in(ts: &TimeSlot, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    ts.start_time >= from && ts.start_time < to
}

#[async_trait]
impl TimeSlotRepository for InMemoryTimeSlotRepository {
    async fn insert_many(&self, time_slots: Vec<TimeSlot>) -> DomainResult<()> {
        for ts in time_slots {
            self.time_slots.insert(ts.id.clone(), ts);
        }
        Ok(())
    }

    async fn exists_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<bool> {
        Ok(self.time_slots.iter().any(|e| starts_in(e.value(), from, to)))
    }

    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeSlot>> {
        let mut found: Vec<TimeSlot> = self
            .time_slots
            .iter()
            .filter(|e| starts_in(e.value(), from, to))
            .map(|e| e.value().clone())
            .collect();
        found.sort_by_key(|ts| ts.start_time);
        Ok(found)
    }

    async fn find_for_slot_between(
        &self,
        station_id: &str,
        slot_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeSlot>> {
        let mut found: Vec<TimeSlot> = self
            .time_slots
            .iter()
            .filter(|e| {
                e.station_id == station_id && e.slot_id == slot_id && starts_in(e.value(), from, to)
            })
            .map(|e| e.value().clone())
            .collect();
        found.sort_by_key(|ts| ts.start_time);
        Ok(found)
    }

    async fn delete_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<String>> {
        Ok(self.remove_where(|ts| starts_in(ts, from, to)))
    }

    async fn delete_starting_before(&self, before: DateTime<Utc>) -> DomainResult<Vec<String>> {
        Ok(self.remove_where(|ts| ts.start_time < before))
    }
}

// ── Bookings ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: DashMap<String, Booking>,
}

impl InMemoryBookingRepository {
    fn newest_first(&self, filter: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut found: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| filter(e.value()))
            .map(|e| e.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    /// Apply `update` only while the booking is Pending or Approved
    fn update_active(&self, id: &str, update: impl FnOnce(&mut Booking)) -> bool {
        match self.bookings.get_mut(id) {
            Some(mut booking) if booking.is_active() => {
                update(booking.value_mut());
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: Booking) -> DomainResult<()> {
        self.bookings.insert(booking.id.clone(), booking);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.bookings.get(id).map(|b| b.clone()))
    }

    async fn find_for_owner(&self, owner_id: &str) -> DomainResult<Vec<Booking>> {
        Ok(self.newest_first(|b| b.owner_id == owner_id))
    }

    async fn find_for_station(&self, station_id: &str) -> DomainResult<Vec<Booking>> {
        Ok(self.newest_first(|b| b.station_id == station_id))
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        Ok(match self.bookings.get_mut(id) {
            Some(mut booking) if booking.status == expected => {
                booking.status = next;
                booking.updated_at = at;
                true
            }
            _ => false,
        })
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
        Ok(match self.bookings.get_mut(id) {
            Some(mut b) if b.is_active() && b.start_time == expected_start => {
                b.start_time = start_time;
                b.end_time = end_time;
                b.qr_expires_at = qr_expires_at;
                b.updated_at = at;
                true
            }
            _ => false,
        })
    }

    async fn set_qr_token(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        Ok(self.update_active(id, |b| {
            b.qr_token = Some(token.to_string());
            b.qr_expires_at = Some(expires_at);
            b.updated_at = at;
        }))
    }

    async fn count_by_status(&self, status: BookingStatus) -> DomainResult<u64> {
        Ok(self.bookings.iter().filter(|e| e.status == status).count() as u64)
    }

    async fn count_approved_starting_after(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        Ok(self
            .bookings
            .iter()
            .filter(|e| e.status == BookingStatus::Approved && e.start_time > now)
            .count() as u64)
    }
}
