use chrono::{DateTime, Utc};
use thiserror::Error;

/// Coarse error classes surfaced to callers of the booking core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Transient,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid range: start {start} must be before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Start {start} is outside the booking window: {reason}")]
    OutOfWindow {
        start: DateTime<Utc>,
        reason: &'static str,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("No available slot at station {station_id} for connector {connector_type}")]
    NoAvailableSlot {
        station_id: String,
        connector_type: String,
    },

    #[error("Station {station_id} has {registered} slots registered for capacity {capacity}")]
    OperationalMismatch {
        station_id: String,
        capacity: u32,
        registered: u64,
    },

    #[error("Station {0} is not active")]
    StationInactive(String),

    #[error("Booking can no longer be modified, cutoff was {cutoff}")]
    TooLateToModify { cutoff: DateTime<Utc> },

    #[error("Booking {booking_id} is {status}, cannot {action}")]
    InvalidTransition {
        booking_id: String,
        status: String,
        action: &'static str,
    },

    #[error("Maintenance run already in progress")]
    MaintenanceInProgress,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Transient failure: {0}")]
    Transient(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field: "id",
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange { .. } | Self::OutOfWindow { .. } | Self::Validation(_) => {
                ErrorKind::Validation
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NoAvailableSlot { .. }
            | Self::OperationalMismatch { .. }
            | Self::StationInactive(_)
            | Self::TooLateToModify { .. }
            | Self::InvalidTransition { .. }
            | Self::MaintenanceInProgress => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Transient(_) => ErrorKind::Transient,
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Transient(format!("Database error: {}", e))
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let now = Utc::now();
        assert_eq!(
            DomainError::InvalidRange { start: now, end: now }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(DomainError::not_found("Booking", "b1").kind(), ErrorKind::NotFound);
        assert_eq!(
            DomainError::TooLateToModify { cutoff: now }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            DomainError::StationInactive("S1".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(DomainError::Forbidden("x".into()).kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn db_errors_are_transient() {
        let err: DomainError = sea_orm::DbErr::Custom("connection reset".into()).into();
        assert!(err.is_transient());
        assert!(err.to_string().starts_with("Transient failure: Database error:"));
    }
}
