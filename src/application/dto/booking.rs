use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::domain::DomainError;

/// Owner request to reserve a connector
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBookingRequest {
    #[validate(length(min = 1, max = 64, message = "station_id is required"))]
    pub station_id: String,
    #[validate(length(min = 1, max = 32, message = "connector_type is required"))]
    pub connector_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(min = 1, max = 64, message = "owner_id is required"))]
    pub owner_id: String,
}

impl NewBookingRequest {
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::Validation(e.to_string()))
    }
}
