//! Booking lifecycle
//!
//! `BookingService` drives the state machine; the remaining modules are the
//! single-purpose checks and issuers it orchestrates.

mod allocator;
mod capacity;
mod policy;
mod qr;
mod service;
mod time_window;

pub use allocator::SlotAllocator;
pub use capacity::CapacityValidator;
pub use policy::BookingPolicy;
pub use qr::{PayloadQrRenderer, QrCode, QrTokenIssuer};
pub use service::{within, BookingService};
pub use time_window::TimeWindowPolicy;
