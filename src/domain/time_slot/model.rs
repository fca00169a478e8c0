//! Time slot domain entity

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSlotStatus {
    #[default]
    Available,
    Booked,
}

impl TimeSlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Booked => "Booked",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Booked" => Self::Booked,
            _ => Self::Available,
        }
    }
}

impl std::fmt::Display for TimeSlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One session window of a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: String,
    pub station_id: String,
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: TimeSlotStatus,
}

impl TimeSlot {
    /// New Available window with a generated id
    pub fn new(
        station_id: impl Into<String>,
        slot_id: impl Into<String>,
        start_time: DateTime<Utc>,
        length: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            station_id: station_id.into(),
            slot_id: slot_id.into(),
            start_time,
            end_time: start_time + length,
            status: TimeSlotStatus::Available,
        }
    }
}
