//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::booking::BookingRepository;
use super::slot::SlotRepository;
use super::station::StationRepository;
use super::time_slot::TimeSlotRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let station = repos.stations().find_by_id("S1").await?;
///     let free = repos.slots().find_available("S1", "CCS").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn stations(&self) -> &dyn StationRepository;
    fn slots(&self) -> &dyn SlotRepository;
    fn time_slots(&self) -> &dyn TimeSlotRepository;
    fn bookings(&self) -> &dyn BookingRepository;
}
