//! Slot allocation
//!
//! Candidates are tried in ascending slot id order. Each attempt is a single
//! conditional write (Available -> Booked) in the store, so two requests
//! racing for the last free slot cannot both win it.

use tracing::{debug, warn};

use crate::domain::{DomainError, DomainResult, Slot, SlotRepository, SlotStatus};

pub struct SlotAllocator;

impl SlotAllocator {
    /// Claim the first free slot of the given connector type at a station.
    pub async fn allocate(
        slots: &dyn SlotRepository,
        station_id: &str,
        connector_type: &str,
    ) -> DomainResult<Slot> {
        let candidates = slots.find_available(station_id, connector_type).await?;

        for mut slot in candidates {
            if slots.try_claim(&slot.id).await? {
                debug!(station_id, slot_id = %slot.id, connector_type, "Slot claimed");
                slot.status = SlotStatus::Booked;
                return Ok(slot);
            }
            metrics::counter!("slot_claim_conflicts_total").increment(1);
            debug!(slot_id = %slot.id, "Slot taken by a concurrent request, trying next");
        }

        Err(DomainError::NoAvailableSlot {
            station_id: station_id.to_string(),
            connector_type: connector_type.to_string(),
        })
    }

    /// Hand a slot back. A slot that was not Booked is left untouched.
    pub async fn release(slots: &dyn SlotRepository, slot_id: &str) -> DomainResult<bool> {
        let released = slots.release(slot_id).await?;
        if !released {
            warn!(slot_id, "Release requested for a slot that was not booked");
        }
        Ok(released)
    }
}
