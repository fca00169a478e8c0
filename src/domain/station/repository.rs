//! Station repository interface

use async_trait::async_trait;

use super::model::Station;
use crate::domain::DomainResult;

#[async_trait]
pub trait StationRepository: Send + Sync {
    /// Insert or replace a station record
    async fn save(&self, station: Station) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>>;
}
