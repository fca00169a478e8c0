pub mod booking;
pub mod dto;
pub mod events;
pub mod services;

// Re-export key types for convenience
pub use booking::{within, BookingPolicy, BookingService, QrCode, QrTokenIssuer};
pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use services::{
    start_maintenance_task, BackfillReport, MaintenanceReport, SchedulePlan, TimeSlotScheduler,
};
