//! Database entities module

pub mod booking;
pub mod slot;
pub mod station;
pub mod time_slot;

pub use booking::Entity as Booking;
pub use slot::Entity as Slot;
pub use station::Entity as Station;
pub use time_slot::Entity as TimeSlot;
