//! Slot aggregate
//!
//! A slot is one physical connector position at a station.

pub mod model;
pub mod repository;

pub use model::{Slot, SlotStatus};
pub use repository::SlotRepository;
