//! Time slot aggregate
//!
//! Materialised fixed-length session windows, one set per slot per
//! calendar day, maintained by the daily scheduler.

pub mod model;
pub mod repository;

pub use model::{TimeSlot, TimeSlotStatus};
pub use repository::TimeSlotRepository;
