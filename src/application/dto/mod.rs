//! Request payloads accepted by the application services

pub mod booking;

pub use booking::NewBookingRequest;
