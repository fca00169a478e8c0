//! Outbound ports

use async_trait::async_trait;

use crate::domain::DomainResult;

/// Turns a check-in token into a scannable image.
#[async_trait]
pub trait QrRenderer: Send + Sync {
    async fn render(&self, token: &str) -> DomainResult<Vec<u8>>;
}
