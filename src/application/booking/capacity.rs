//! Station capacity check
//!
//! A station whose operator has registered fewer slots than its declared
//! capacity is not bookable until the setup gap is closed.

use crate::domain::{DomainError, DomainResult, Station};

pub struct CapacityValidator;

impl CapacityValidator {
    pub fn check(station: &Station, registered_slots: u64) -> DomainResult<()> {
        if registered_slots < u64::from(station.capacity) {
            return Err(DomainError::OperationalMismatch {
                station_id: station.id.clone(),
                capacity: station.capacity,
                registered: registered_slots,
            });
        }
        Ok(())
    }
}
