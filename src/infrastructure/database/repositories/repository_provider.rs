//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{
    BookingRepository, RepositoryProvider, SlotRepository, StationRepository, TimeSlotRepository,
};

use super::booking_repository::SeaOrmBookingRepository;
use super::slot_repository::SeaOrmSlotRepository;
use super::station_repository::SeaOrmStationRepository;
use super::time_slot_repository::SeaOrmTimeSlotRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let station = repos.stations().find_by_id("S1").await?;
/// let claimed = repos.slots().try_claim("S1-CCS-1").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    stations: SeaOrmStationRepository,
    slots: SeaOrmSlotRepository,
    time_slots: SeaOrmTimeSlotRepository,
    bookings: SeaOrmBookingRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            stations: SeaOrmStationRepository::new(db.clone()),
            slots: SeaOrmSlotRepository::new(db.clone()),
            time_slots: SeaOrmTimeSlotRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Booking, BookingStatus, Slot, SlotStatus, Station, TimeSlot};
    use crate::infrastructure::database::{init_database, DatabaseConfig};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    async fn repos() -> SeaOrmRepositoryProvider {
        let db = init_database(&DatabaseConfig::in_memory())
            .await
            .expect("in-memory sqlite");
        let repos = SeaOrmRepositoryProvider::new(db);
        repos
            .stations()
            .save(Station::new("S1", 2).with_name("Depot"))
            .await
            .unwrap();
        repos.slots().save(Slot::new("a", "S1", "CCS")).await.unwrap();
        repos.slots().save(Slot::new("b", "S1", "CCS")).await.unwrap();
        repos
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn station_upsert_round_trips() {
        let repos = repos().await;
        let mut station = repos.stations().find_by_id("S1").await.unwrap().unwrap();
        assert_eq!(station.name.as_deref(), Some("Depot"));
        assert_eq!(station.capacity, 2);

        station.deactivate();
        repos.stations().save(station).await.unwrap();
        let stored = repos.stations().find_by_id("S1").await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(repos.stations().find_by_id("S2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn slot_claim_is_conditional() {
        let repos = repos().await;
        assert_eq!(repos.slots().count_for_station("S1").await.unwrap(), 2);

        let free = repos.slots().find_available("S1", "CCS").await.unwrap();
        assert_eq!(free.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), ["a", "b"]);

        assert!(repos.slots().try_claim("a").await.unwrap());
        assert!(!repos.slots().try_claim("a").await.unwrap());
        let free = repos.slots().find_available("S1", "CCS").await.unwrap();
        assert_eq!(free.len(), 1);

        assert!(repos.slots().release("a").await.unwrap());
        assert!(!repos.slots().release("a").await.unwrap());
        let slot = repos.slots().find_by_id("a").await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Available);
    }

    #[tokio::test]
    async fn time_slot_ids_survive_status_flips() {
        let repos = repos().await;
        let batch = vec![
            TimeSlot::new("S1", "a", at(2, 1), Duration::hours(2)),
            TimeSlot::new("S1", "a", at(2, 5), Duration::hours(2)),
            TimeSlot::new("S1", "a", at(3, 1), Duration::hours(2)),
        ];
        let ids: Vec<String> = batch.iter().map(|t| t.id.clone()).collect();
        repos.time_slots().insert_many(batch).await.unwrap();
        repos.slots().append_time_slots("a", &ids).await.unwrap();

        assert!(repos.slots().try_claim("a").await.unwrap());
        let slot = repos.slots().find_by_id("a").await.unwrap().unwrap();
        assert_eq!(slot.time_slot_ids, ids);
        assert_eq!(slot.status, SlotStatus::Booked);

        let day = repos
            .time_slots()
            .find_for_slot_between("S1", "a", at(2, 0), at(3, 0))
            .await
            .unwrap();
        assert_eq!(day.len(), 2);
        assert!(repos
            .time_slots()
            .exists_starting_between(at(3, 0), at(4, 0))
            .await
            .unwrap());

        let deleted = repos
            .time_slots()
            .delete_starting_between(at(2, 0), at(3, 0))
            .await
            .unwrap();
        assert_eq!(deleted.len(), 2);
        repos.slots().detach_time_slots(&deleted).await.unwrap();

        let slot = repos.slots().find_by_id("a").await.unwrap().unwrap();
        assert_eq!(slot.time_slot_ids, vec![ids[2].clone()]);

        let purged = repos.time_slots().delete_starting_before(at(10, 0)).await.unwrap();
        assert_eq!(purged, vec![ids[2].clone()]);
    }

    #[tokio::test]
    async fn booking_writes_check_stored_status() {
        let repos = repos().await;
        let mut booking = Booking::new("S1", "a", "owner", at(5, 10), at(5, 11), at(1, 9));
        booking.attach_qr("token-1".to_string(), at(1, 9) + Duration::minutes(15));
        let id = booking.id.clone();
        repos.bookings().insert(booking.clone()).await.unwrap();

        let stored = repos.bookings().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored, booking);

        let bookings = repos.bookings();
        assert!(bookings
            .reschedule(&id, at(5, 10), at(6, 10), at(6, 12), Some(at(1, 9)), at(1, 10))
            .await
            .unwrap());
        assert!(!bookings
            .reschedule(&id, at(5, 10), at(7, 10), at(7, 12), None, at(1, 10))
            .await
            .unwrap());
        assert!(bookings.set_qr_token(&id, "token-2", at(1, 11), at(1, 11)).await.unwrap());
        assert!(bookings
            .compare_and_set_status(&id, BookingStatus::Pending, BookingStatus::Approved, at(1, 12))
            .await
            .unwrap());
        assert!(!bookings
            .compare_and_set_status(&id, BookingStatus::Pending, BookingStatus::Cancelled, at(1, 12))
            .await
            .unwrap());

        assert_eq!(bookings.count_by_status(BookingStatus::Approved).await.unwrap(), 1);
        assert_eq!(bookings.count_approved_starting_after(at(2, 0)).await.unwrap(), 1);
        assert_eq!(bookings.count_approved_starting_after(at(7, 0)).await.unwrap(), 0);

        let stored = bookings.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Approved);
        assert_eq!(stored.start_time, at(6, 10));
        assert_eq!(stored.qr_token.as_deref(), Some("token-2"));
        assert_eq!(stored.updated_at, at(1, 12));

        assert!(bookings
            .compare_and_set_status(&id, BookingStatus::Approved, BookingStatus::Finalized, at(6, 13))
            .await
            .unwrap());
        assert!(!bookings.set_qr_token(&id, "token-3", at(6, 13), at(6, 13)).await.unwrap());
        assert_eq!(bookings.find_for_owner("owner").await.unwrap().len(), 1);
        assert_eq!(bookings.find_for_station("S1").await.unwrap().len(), 1);
    }
}
