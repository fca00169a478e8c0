//! Application services

mod maintenance_task;
mod time_slot_scheduler;

pub use maintenance_task::start_maintenance_task;
pub use time_slot_scheduler::{BackfillReport, MaintenanceReport, SchedulePlan, TimeSlotScheduler};
