//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod repository_provider;
pub mod slot_repository;
pub mod station_repository;
pub mod time_slot_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
