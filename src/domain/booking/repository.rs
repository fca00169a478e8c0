//! Booking repository interface
//!
//! Status changes go through compare-and-set so two racing transitions of
//! the same booking cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Booking, BookingStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>>;

    /// Bookings of one owner, newest first
    async fn find_for_owner(&self, owner_id: &str) -> DomainResult<Vec<Booking>>;

    /// Bookings at one station, newest first
    async fn find_for_station(&self, station_id: &str) -> DomainResult<Vec<Booking>>;

    /// Set `next` only if the stored status equals `expected`.
    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Replace the time range (and QR expiry) of a Pending/Approved booking
    /// whose stored start still equals `expected_start`. Returns false if the
    /// booking is no longer active or was moved in the meantime.
    async fn reschedule(
        &self,
        id: &str,
        expected_start: DateTime<Utc>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        qr_expires_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Overwrite the check-in token of a Pending/Approved booking.
    /// Returns false if the booking is no longer active.
    async fn set_qr_token(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;

    async fn count_by_status(&self, status: BookingStatus) -> DomainResult<u64>;

    /// Approved bookings whose start is after `now`
    async fn count_approved_starting_after(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}
