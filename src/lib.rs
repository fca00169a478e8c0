//! # EV Slot Booking
//!
//! Charging-slot booking core for EV stations: capacity checks, booking
//! time rules, atomic slot allocation, QR check-in tokens, the booking
//! state machine and a rolling seven-day window of time slots.
//!
//! ## Architecture
//!
//! - **domain**: entities, statuses and repository traits
//! - **application**: booking lifecycle, scheduler, events
//! - **infrastructure**: SeaORM (SQLite) and in-memory repository backends
//! - **shared**: errors, clock, shutdown coordination
//! - **server**: process runtime wiring it all together

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::booking::{BookingService, QrCode};
pub use application::events::{create_event_bus, Event, EventBus, SharedEventBus};
pub use application::services::{MaintenanceReport, TimeSlotScheduler};

// Re-export storage backends for easy access
pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};
