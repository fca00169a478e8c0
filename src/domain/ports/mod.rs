//! Domain ports
//!
//! Outbound collaborators the core calls but does not implement.

pub mod outbound;

pub use outbound::QrRenderer;
