//! In-memory repository backend

mod memory;

pub use memory::{
    InMemoryBookingRepository, InMemoryRepositoryProvider, InMemorySlotRepository,
    InMemoryStationRepository, InMemoryTimeSlotRepository,
};
