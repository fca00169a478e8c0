//! Configuration module
//!
//! Reads `config.toml` (default `~/.config/ev-slot-booking/config.toml`).
//! Every section is optional; missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::application::booking::BookingPolicy;
use crate::application::services::SchedulePlan;
use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;

/// Fixed local start times of the daily charging sessions
/// Longest booking horizon and scheduler window, in days
const MAX_DAYS: i64 = 366;
/// Longest QR lifetime and session length, in minutes
const MAX_MINUTES: i64 = 24 * 60;

pub const DEFAULT_START_TIMES: [&str; 10] = [
    "01:15", "03:30", "05:45", "08:00", "10:15", "12:30", "14:45", "17:00", "19:15", "21:30",
];

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ev-slot-booking")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub booking: BookingConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Seconds allowed for cleanup after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./ev_booking.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseSection {
    pub fn connection(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            // every connection to an in-memory SQLite URL opens its own database
            max_connections: if self.url.contains(":memory:") {
                1
            } else {
                self.max_connections
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive, overridden by RUST_LOG
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BookingConfig {
    /// How far ahead a booking may start
    pub horizon_days: i64,
    /// Update/cancel is refused this many hours before start
    pub modify_cutoff_hours: i64,
    pub qr_ttl_minutes: i64,
    /// Prefix of the check-in payload encoded into QR codes
    pub checkin_base_uri: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            modify_cutoff_hours: 12,
            qr_ttl_minutes: 15,
            checkin_base_uri: "evbooking://checkin/".to_string(),
        }
    }
}

impl BookingConfig {
    pub fn policy(&self) -> BookingPolicy {
        BookingPolicy {
            horizon: Duration::days(self.horizon_days),
            modify_cutoff: Duration::hours(self.modify_cutoff_hours),
            qr_ttl: Duration::minutes(self.qr_ttl_minutes),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// IANA zone the stations operate in, e.g. "Asia/Kolkata"
    pub timezone: String,
    /// Local time of day ("HH:MM") the daily run fires
    pub run_at: String,
    pub session_minutes: i64,
    /// Local session start times ("HH:MM")
    pub start_times: Vec<String>,
    pub window_days: u32,
    /// Purge stale days and fill missing ones before the first tick
    pub backfill_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: "UTC".to_string(),
            run_at: "00:00".to_string(),
            session_minutes: 120,
            start_times: DEFAULT_START_TIMES.iter().map(|s| s.to_string()).collect(),
            window_days: 7,
            backfill_on_start: true,
        }
    }
}

impl SchedulerConfig {
    pub fn tz(&self) -> Result<Tz, InfraError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| InfraError::InvalidConfig(format!("scheduler.timezone: {}", e)))
    }

    pub fn plan(&self) -> Result<SchedulePlan, InfraError> {
        if self.window_days == 0 || i64::from(self.window_days) > MAX_DAYS {
            return Err(InfraError::InvalidConfig(format!(
                "scheduler.window_days must be between 1 and {}",
                MAX_DAYS
            )));
        }
        if self.session_minutes <= 0 || self.session_minutes > MAX_MINUTES {
            return Err(InfraError::InvalidConfig(format!(
                "scheduler.session_minutes must be between 1 and {}",
                MAX_MINUTES
            )));
        }

        let mut start_times = self
            .start_times
            .iter()
            .map(|s| parse_time("scheduler.start_times", s))
            .collect::<Result<Vec<_>, _>>()?;
        start_times.sort();
        start_times.dedup();

        Ok(SchedulePlan {
            timezone: self.tz()?,
            run_at: parse_time("scheduler.run_at", &self.run_at)?,
            start_times,
            session_length: Duration::minutes(self.session_minutes),
            window_days: self.window_days,
        })
    }
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, InfraError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| InfraError::InvalidConfig(format!("{} '{}': {}", key, value, e)))
}

impl AppConfig {
    /// Load from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let cfg: AppConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        let b = &self.booking;
        if self.database.max_connections == 0 {
            return Err(InfraError::InvalidConfig(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if b.horizon_days <= 0 || b.horizon_days > MAX_DAYS {
            return Err(InfraError::InvalidConfig(format!(
                "booking.horizon_days must be between 1 and {}",
                MAX_DAYS
            )));
        }
        if b.modify_cutoff_hours < 0 || b.modify_cutoff_hours > MAX_DAYS * 24 {
            return Err(InfraError::InvalidConfig(format!(
                "booking.modify_cutoff_hours must be between 0 and {}",
                MAX_DAYS * 24
            )));
        }
        if b.qr_ttl_minutes <= 0 || b.qr_ttl_minutes > MAX_MINUTES {
            return Err(InfraError::InvalidConfig(format!(
                "booking.qr_ttl_minutes must be between 1 and {}",
                MAX_MINUTES
            )));
        }
        self.scheduler.plan()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        cfg.validate().expect("defaults should validate");
        let plan = cfg.scheduler.plan().unwrap();
        assert_eq!(plan.start_times.len(), 10);
        assert_eq!(plan.session_length, Duration::minutes(120));
        assert_eq!(plan.window_days, 7);
        assert_eq!(cfg.booking.policy().modify_cutoff, Duration::hours(12));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [scheduler]
            timezone = "Asia/Kolkata"
            run_at = "00:05"

            [booking]
            qr_ttl_minutes = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scheduler.tz().unwrap(), chrono_tz::Asia::Kolkata);
        assert_eq!(cfg.booking.qr_ttl_minutes, 10);
        assert_eq!(cfg.booking.horizon_days, 7);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn rejects_unknown_zone_and_bad_times() {
        assert!(AppConfig::from_toml("[scheduler]\ntimezone = \"Mars/Olympus\"").is_err());
        assert!(AppConfig::from_toml("[scheduler]\nstart_times = [\"25:00\"]").is_err());
        assert!(AppConfig::from_toml("[booking]\nhorizon_days = 0").is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        for toml in [
            "[booking]\nhorizon_days = 9223372036854775807",
            "[booking]\nmodify_cutoff_hours = 9223372036854775807",
            "[booking]\nqr_ttl_minutes = 100000",
            "[scheduler]\nsession_minutes = 9223372036854775807",
            "[scheduler]\nwindow_days = 4000000000",
        ] {
            assert!(AppConfig::from_toml(toml).is_err(), "accepted: {}", toml);
        }
        assert!(AppConfig::from_toml("[booking]\nhorizon_days = 366").is_ok());
    }

    #[test]
    fn in_memory_database_uses_one_connection() {
        let cfg = AppConfig::from_toml("[database]\nurl = \"sqlite::memory:\"").unwrap();
        assert_eq!(cfg.database.connection().max_connections, 1);
        assert_eq!(AppConfig::default().database.connection().max_connections, 10);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = AppConfig::load(Path::new("/nonexistent/ev-slot-booking.toml")).unwrap();
        assert_eq!(cfg.scheduler.window_days, 7);
    }
}
