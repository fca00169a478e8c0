//! Booking lifecycle service
//!
//! ```text
//!   create ──► Pending ──approve──► Approved ──finalize──► Finalized
//!                 │                    │
//!                 └──────cancel────────┴──────────────────► Cancelled
//! ```
//!
//! Create claims a slot, Cancel and Finalize release it. Status writes are
//! compare-and-set, so only the winner of two racing transitions touches
//! the slot.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::{
    BookingPolicy, CapacityValidator, QrCode, QrTokenIssuer, SlotAllocator, TimeWindowPolicy,
};
use crate::application::dto::NewBookingRequest;
use crate::application::events::{
    BookingCreatedEvent, BookingRescheduledEvent, BookingStatusChangedEvent, Event,
    QrCodeIssuedEvent, SharedEventBus, SlotStatusChangedEvent,
};
use crate::domain::ports::QrRenderer;
use crate::domain::{
    Booking, BookingStatus, DomainError, DomainResult, Principal, RepositoryProvider, Slot,
    SlotStatus,
};
use crate::shared::clock::SharedClock;

/// Run `operation` under a caller deadline. Expiry surfaces as a transient
/// error; the operation itself is not retried.
pub async fn within<T, F>(deadline: std::time::Duration, operation: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    tokio::time::timeout(deadline, operation)
        .await
        .map_err(|_| DomainError::Transient(format!("deadline of {:?} exceeded", deadline)))?
}

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    events: SharedEventBus,
    window: TimeWindowPolicy,
    qr: QrTokenIssuer,
}

impl BookingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        events: SharedEventBus,
        renderer: Arc<dyn QrRenderer>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            repos,
            clock,
            events,
            window: TimeWindowPolicy::from(&policy),
            qr: QrTokenIssuer::new(renderer, policy.qr_ttl),
        }
    }

    // ── Commands ───────────────────────────────────────────────

    pub async fn create_booking(
        &self,
        station_id: &str,
        connector_type: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        owner_id: &str,
    ) -> DomainResult<Booking> {
        self.create(NewBookingRequest {
            station_id: station_id.to_string(),
            connector_type: connector_type.to_string(),
            start_time,
            end_time,
            owner_id: owner_id.to_string(),
        })
        .await
    }

    pub async fn create(&self, request: NewBookingRequest) -> DomainResult<Booking> {
        request.check()?;
        let now = self.clock.now();
        self.window
            .check_create(request.start_time, request.end_time, now)?;

        let station = self
            .repos
            .stations()
            .find_by_id(&request.station_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Station", &request.station_id))?;
        if !station.is_active {
            return Err(DomainError::StationInactive(station.id));
        }

        let registered = self.repos.slots().count_for_station(&station.id).await?;
        CapacityValidator::check(&station, registered)?;

        let task = ClaimTask {
            repos: self.repos.clone(),
            qr: self.qr.clone(),
            events: self.events.clone(),
        };
        // Detached so that dropping the caller cannot strand a claimed slot.
        tokio::spawn(task.run(request, station.id, now))
            .await
            .map_err(|e| DomainError::Transient(format!("booking task aborted: {}", e)))?
    }

    /// Move the booking's time range. Slot availability is not re-checked.
    pub async fn update_booking(
        &self,
        booking_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        requester: &Principal,
    ) -> DomainResult<Booking> {
        let mut booking = self.get_booking(booking_id).await?;
        ensure_active(&booking, "update")?;
        authorize(&booking, requester)?;

        let now = self.clock.now();
        self.window.check_modify(booking.start_time, now)?;
        self.window.check_create(start_time, end_time, now)?;

        let qr_expires_at = booking.qr_expires_at.map(|expiry| expiry.min(start_time));
        let updated = self
            .repos
            .bookings()
            .reschedule(
                booking_id,
                booking.start_time,
                start_time,
                end_time,
                qr_expires_at,
                now,
            )
            .await?;
        if !updated {
            return Err(self.lost_race(booking_id, "update").await);
        }

        booking.start_time = start_time;
        booking.end_time = end_time;
        booking.qr_expires_at = qr_expires_at;
        booking.updated_at = now;

        info!(booking_id, requester = %requester.id(), %start_time, %end_time, "Booking rescheduled");
        metrics::counter!("bookings_total", "action" => "update").increment(1);
        self.events
            .publish(Event::BookingRescheduled(BookingRescheduledEvent {
                booking_id: booking.id.clone(),
                station_id: booking.station_id.clone(),
                start_time,
                end_time,
                timestamp: now,
            }));

        Ok(booking)
    }

    pub async fn cancel_booking(&self, booking_id: &str, requester: &Principal) -> DomainResult<()> {
        let booking = self.get_booking(booking_id).await?;
        ensure_active(&booking, "cancel")?;
        authorize(&booking, requester)?;

        let now = self.clock.now();
        self.window.check_modify(booking.start_time, now)?;

        self.close(&booking, BookingStatus::Cancelled, requester.id(), now, "cancel")
            .await
    }

    pub async fn approve_booking(&self, booking_id: &str, operator_id: &str) -> DomainResult<()> {
        let booking = self.get_booking(booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(invalid_transition(&booking, "approve"));
        }
        let now = self.clock.now();
        self.transition(&booking, BookingStatus::Approved, operator_id, now, "approve")
            .await
    }

    pub async fn finalize_booking(&self, booking_id: &str, operator_id: &str) -> DomainResult<()> {
        let booking = self.get_booking(booking_id).await?;
        if booking.status != BookingStatus::Approved {
            return Err(invalid_transition(&booking, "finalize"));
        }
        let now = self.clock.now();
        self.close(&booking, BookingStatus::Finalized, operator_id, now, "finalize")
            .await
    }

    /// Mint a fresh check-in token, replacing the stored one.
    pub async fn generate_qr_code(&self, booking_id: &str) -> DomainResult<QrCode> {
        let booking = self.get_booking(booking_id).await?;
        ensure_active(&booking, "issue a QR code for")?;

        let now = self.clock.now();
        let qr = self.qr.issue(booking.start_time, now).await?;
        let stored = self
            .repos
            .bookings()
            .set_qr_token(booking_id, &qr.token, qr.expires_at, now)
            .await?;
        if !stored {
            return Err(self.lost_race(booking_id, "issue a QR code for").await);
        }

        info!(booking_id, expires_at = %qr.expires_at, "QR code issued");
        self.events.publish(Event::QrCodeIssued(QrCodeIssuedEvent {
            booking_id: booking_id.to_string(),
            expires_at: qr.expires_at,
            timestamp: now,
        }));

        Ok(qr)
    }

    // ── Queries ────────────────────────────────────────────────

    pub async fn get_booking(&self, booking_id: &str) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))
    }

    pub async fn bookings_for_owner(&self, owner_id: &str) -> DomainResult<Vec<Booking>> {
        self.repos.bookings().find_for_owner(owner_id).await
    }

    pub async fn bookings_for_station(&self, station_id: &str) -> DomainResult<Vec<Booking>> {
        self.repos.bookings().find_for_station(station_id).await
    }

    pub async fn count_pending_bookings(&self) -> DomainResult<u64> {
        self.repos
            .bookings()
            .count_by_status(BookingStatus::Pending)
            .await
    }

    pub async fn count_approved_future_bookings(&self) -> DomainResult<u64> {
        self.repos
            .bookings()
            .count_approved_starting_after(self.clock.now())
            .await
    }

    // ── Internals ──────────────────────────────────────────────

    async fn transition(
        &self,
        booking: &Booking,
        next: BookingStatus,
        actor_id: &str,
        now: DateTime<Utc>,
        action: &'static str,
    ) -> DomainResult<()> {
        self.swap_status(booking, next, now, action).await?;
        self.record_transition(booking, next, actor_id, now, action);
        Ok(())
    }

    /// Move an active booking to a terminal status and hand its slot back.
    /// If the slot cannot be released the status change is reverted, so the
    /// caller can retry.
    async fn close(
        &self,
        booking: &Booking,
        next: BookingStatus,
        actor_id: &str,
        now: DateTime<Utc>,
        action: &'static str,
    ) -> DomainResult<()> {
        self.swap_status(booking, next, now, action).await?;

        let released = match SlotAllocator::release(self.repos.slots(), &booking.slot_id).await {
            Ok(released) => released,
            Err(e) => {
                warn!(booking_id = %booking.id, slot_id = %booking.slot_id, error = %e, "Slot release failed, reverting {}", action);
                match self
                    .repos
                    .bookings()
                    .compare_and_set_status(&booking.id, next, booking.status, now)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        error!(booking_id = %booking.id, "Booking changed before revert, slot left booked")
                    }
                    Err(revert_err) => {
                        error!(booking_id = %booking.id, error = %revert_err, "Failed to revert booking status")
                    }
                }
                return Err(e);
            }
        };

        self.record_transition(booking, next, actor_id, now, action);
        if released {
            publish_slot_status(
                &self.events,
                &booking.station_id,
                &booking.slot_id,
                SlotStatus::Available,
                now,
            );
        }
        Ok(())
    }

    async fn swap_status(
        &self,
        booking: &Booking,
        next: BookingStatus,
        now: DateTime<Utc>,
        action: &'static str,
    ) -> DomainResult<()> {
        let swapped = self
            .repos
            .bookings()
            .compare_and_set_status(&booking.id, booking.status, next, now)
            .await?;
        if !swapped {
            return Err(self.lost_race(&booking.id, action).await);
        }
        Ok(())
    }

    fn record_transition(
        &self,
        booking: &Booking,
        next: BookingStatus,
        actor_id: &str,
        now: DateTime<Utc>,
        action: &'static str,
    ) {
        info!(
            booking_id = %booking.id,
            actor_id,
            from = %booking.status,
            to = %next,
            "Booking status changed"
        );
        metrics::counter!("bookings_total", "action" => action).increment(1);

        self.events
            .publish(Event::BookingStatusChanged(BookingStatusChangedEvent {
                booking_id: booking.id.clone(),
                station_id: booking.station_id.clone(),
                owner_id: booking.owner_id.clone(),
                old_status: booking.status.to_string(),
                new_status: next.to_string(),
                actor_id: actor_id.to_string(),
                timestamp: now,
            }));
    }

    /// Error for a write that found the booking in a different state than
    /// the one it was read in.
    async fn lost_race(&self, booking_id: &str, action: &'static str) -> DomainError {
        match self.get_booking(booking_id).await {
            Ok(current) => invalid_transition(&current, action),
            Err(e) => e,
        }
    }
}

/// The part of a create that runs between claiming a slot and storing the
/// booking. Any failure in between releases the slot again.
struct ClaimTask {
    repos: Arc<dyn RepositoryProvider>,
    qr: QrTokenIssuer,
    events: SharedEventBus,
}

impl ClaimTask {
    async fn run(
        self,
        request: NewBookingRequest,
        station_id: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let slot =
            SlotAllocator::allocate(self.repos.slots(), &station_id, &request.connector_type)
                .await?;

        let booking = match self.persist(&request, &slot, now).await {
            Ok(booking) => booking,
            Err(e) => {
                warn!(slot_id = %slot.id, error = %e, "Booking creation failed after claim, releasing slot");
                if let Err(release_err) =
                    SlotAllocator::release(self.repos.slots(), &slot.id).await
                {
                    error!(slot_id = %slot.id, error = %release_err, "Failed to release slot");
                }
                return Err(e);
            }
        };

        info!(
            booking_id = %booking.id,
            station_id = %booking.station_id,
            slot_id = %booking.slot_id,
            owner_id = %booking.owner_id,
            "Booking created"
        );
        metrics::counter!("bookings_total", "action" => "create").increment(1);

        self.events.publish(Event::BookingCreated(BookingCreatedEvent {
            booking_id: booking.id.clone(),
            station_id: booking.station_id.clone(),
            slot_id: booking.slot_id.clone(),
            owner_id: booking.owner_id.clone(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            timestamp: now,
        }));
        publish_slot_status(&self.events, &slot.station_id, &slot.id, SlotStatus::Booked, now);

        Ok(booking)
    }

    async fn persist(
        &self,
        request: &NewBookingRequest,
        slot: &Slot,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let mut booking = Booking::new(
            &slot.station_id,
            &slot.id,
            &request.owner_id,
            request.start_time,
            request.end_time,
            now,
        );
        let qr = self.qr.issue(booking.start_time, now).await?;
        booking.attach_qr(qr.token, qr.expires_at);
        self.repos.bookings().insert(booking.clone()).await?;
        Ok(booking)
    }
}

fn publish_slot_status(
    events: &SharedEventBus,
    station_id: &str,
    slot_id: &str,
    status: SlotStatus,
    now: DateTime<Utc>,
) {
    events.publish(Event::SlotStatusChanged(SlotStatusChangedEvent {
        station_id: station_id.to_string(),
        slot_id: slot_id.to_string(),
        status: status.to_string(),
        timestamp: now,
    }));
}

fn ensure_active(booking: &Booking, action: &'static str) -> DomainResult<()> {
    if booking.is_active() {
        Ok(())
    } else {
        Err(invalid_transition(booking, action))
    }
}

fn invalid_transition(booking: &Booking, action: &'static str) -> DomainError {
    DomainError::InvalidTransition {
        booking_id: booking.id.clone(),
        status: booking.status.to_string(),
        action,
    }
}

/// Owners may only touch their own bookings; operators bound to a station
/// only that station's bookings.
fn authorize(booking: &Booking, requester: &Principal) -> DomainResult<()> {
    match requester {
        Principal::Owner { id } if *id != booking.owner_id => Err(DomainError::Forbidden(
            format!("booking {} belongs to another owner", booking.id),
        )),
        Principal::Operator {
            id,
            station_id: Some(station_id),
        } if *station_id != booking.station_id => Err(DomainError::Forbidden(format!(
            "operator {} is not assigned to station {}",
            id, booking.station_id
        ))),
        _ => Ok(()),
    }
}
