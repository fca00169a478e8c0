//! Station aggregate
//!
//! Stations are owned by an external catalogue; the booking core only reads
//! their id, capacity and active flag.

pub mod model;
pub mod repository;

pub use model::Station;
pub use repository::StationRepository;
