//! Slot domain entity

use chrono::{DateTime, Utc};

/// Allocation status of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotStatus {
    #[default]
    Available,
    /// Held by exactly one Pending or Approved booking
    Booked,
    /// Taken out of service by the operator
    Inactive,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Booked => "Booked",
            Self::Inactive => "Inactive",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Available" => Self::Available,
            "Booked" => Self::Booked,
            _ => Self::Inactive,
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connector position at a station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: String,
    pub station_id: String,
    /// Connector tag, e.g. "CCS", "CHAdeMO", "Type2"
    pub connector_type: String,
    pub status: SlotStatus,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    /// Ids of the time slots generated for this slot by the maintenance job
    pub time_slot_ids: Vec<String>,
}

impl Slot {
    pub fn new(
        id: impl Into<String>,
        station_id: impl Into<String>,
        connector_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            station_id: station_id.into(),
            connector_type: connector_type.into(),
            status: SlotStatus::Available,
            active_from: None,
            active_until: None,
            time_slot_ids: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: SlotStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }
}
