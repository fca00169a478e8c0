//! Booking domain entity

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    /// Created by an owner, slot claimed, awaiting operator approval
    Pending,
    /// Approved by an operator
    Approved,
    /// Session completed, slot released
    Finalized,
    /// Cancelled by owner or staff, slot released
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Finalized => "Finalized",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Approved" => Self::Approved,
            "Finalized" => Self::Finalized,
            _ => Self::Cancelled,
        }
    }

    /// Pending and Approved bookings hold their slot
    pub fn holds_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        !self.holds_slot()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Slot reservation made by an owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: String,
    pub station_id: String,
    pub slot_id: String,
    pub owner_id: String,
    pub status: BookingStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Current check-in token; regenerating overwrites it
    pub qr_token: Option<String>,
    pub qr_expires_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn new(
        station_id: impl Into<String>,
        slot_id: impl Into<String>,
        owner_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            station_id: station_id.into(),
            slot_id: slot_id.into(),
            owner_id: owner_id.into(),
            status: BookingStatus::Pending,
            start_time,
            end_time,
            created_at: now,
            updated_at: now,
            qr_token: None,
            qr_expires_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.holds_slot()
    }

    pub fn attach_qr(&mut self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        self.qr_token = Some(token.into());
        self.qr_expires_at = Some(expires_at);
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_booking() -> Booking {
        let now = Utc::now();
        Booking::new(
            "S1",
            "slot-1",
            "owner-a",
            now + Duration::hours(13),
            now + Duration::hours(14),
            now,
        )
    }

    #[test]
    fn new_booking_is_pending_and_active() {
        let b = sample_booking();
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.is_active());
        assert!(b.qr_token.is_none());
        assert_eq!(b.created_at, b.updated_at);
    }

    #[test]
    fn terminal_statuses_release_slot() {
        assert!(BookingStatus::Approved.holds_slot());
        assert!(BookingStatus::Finalized.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn attach_qr_overwrites_previous_token() {
        let mut b = sample_booking();
        let first = b.start_time - Duration::hours(1);
        b.attach_qr("tok-1", first);
        b.attach_qr("tok-2", first + Duration::minutes(5));
        assert_eq!(b.qr_token.as_deref(), Some("tok-2"));
        assert_eq!(b.qr_expires_at, Some(first + Duration::minutes(5)));
    }

    #[test]
    fn status_parsing() {
        assert_eq!(BookingStatus::from_str("Approved"), BookingStatus::Approved);
        assert_eq!(BookingStatus::from_str("garbage"), BookingStatus::Cancelled);
    }
}
