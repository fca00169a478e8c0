pub mod booking;
pub mod events;
pub mod ports;
pub mod principal;
pub mod repositories;
pub mod slot;
pub mod station;
pub mod time_slot;

pub use booking::{Booking, BookingRepository, BookingStatus};
pub use principal::{Principal, Role};
pub use repositories::{DomainResult, RepositoryProvider};
pub use slot::{Slot, SlotRepository, SlotStatus};
pub use station::{Station, StationRepository};
pub use time_slot::{TimeSlot, TimeSlotRepository, TimeSlotStatus};

pub use crate::shared::errors::{DomainError, ErrorKind};
