//! Notification events
//!
//! Defines all event types that can be broadcasted to subscribers.
//! Delivery is best-effort; nothing in the booking core waits on it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    BookingCreated(BookingCreatedEvent),
    BookingStatusChanged(BookingStatusChangedEvent),
    BookingRescheduled(BookingRescheduledEvent),
    QrCodeIssued(QrCodeIssuedEvent),
    SlotStatusChanged(SlotStatusChangedEvent),
    MaintenanceCompleted(MaintenanceCompletedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BookingCreated(_) => "booking_created",
            Event::BookingStatusChanged(_) => "booking_status_changed",
            Event::BookingRescheduled(_) => "booking_rescheduled",
            Event::QrCodeIssued(_) => "qr_code_issued",
            Event::SlotStatusChanged(_) => "slot_status_changed",
            Event::MaintenanceCompleted(_) => "maintenance_completed",
        }
    }

    pub fn station_id(&self) -> Option<&str> {
        match self {
            Event::BookingCreated(e) => Some(&e.station_id),
            Event::BookingStatusChanged(e) => Some(&e.station_id),
            Event::BookingRescheduled(e) => Some(&e.station_id),
            Event::QrCodeIssued(_) => None,
            Event::SlotStatusChanged(e) => Some(&e.station_id),
            Event::MaintenanceCompleted(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedEvent {
    pub booking_id: String,
    pub station_id: String,
    pub slot_id: String,
    pub owner_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStatusChangedEvent {
    pub booking_id: String,
    pub station_id: String,
    pub owner_id: String,
    pub old_status: String,
    pub new_status: String,
    /// Principal or operator that triggered the change
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRescheduledEvent {
    pub booking_id: String,
    pub station_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCodeIssuedEvent {
    pub booking_id: String,
    pub expires_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStatusChangedEvent {
    pub station_id: String,
    pub slot_id: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceCompletedEvent {
    pub deleted_day: NaiveDate,
    pub deleted: usize,
    pub added_day: NaiveDate,
    pub generated: usize,
    pub timestamp: DateTime<Utc>,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub event: Event,
    pub published_at: DateTime<Utc>,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            published_at: Utc::now(),
        }
    }
}
