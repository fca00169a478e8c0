//! Booking service runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: tracing, database connection
//! and migrations, booking and scheduler services, the daily maintenance
//! task, and graceful shutdown.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::application::booking::{BookingService, PayloadQrRenderer};
use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::services::{start_maintenance_task, TimeSlotScheduler};
use crate::config::{AppConfig, LoggingConfig};
use crate::domain::RepositoryProvider;
use crate::infrastructure::{init_database, SeaOrmRepositoryProvider};
use crate::shared::clock::{SharedClock, SystemClock};
use crate::shared::errors::{AppError, InfraError};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level. Calling it twice is harmless.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let result = if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if result.is_err() {
        warn!("Tracing subscriber already installed, keeping the existing one");
    }
}

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the booking service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Time source shared by every service (default: wall clock).
    pub clock: SharedClock,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running booking service.
///
/// ```rust,no_run
/// use ev_slot_booking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.run_until_shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Booking lifecycle operations.
    pub bookings: Arc<BookingService>,
    /// Rolling time slot window.
    pub scheduler: Arc<TimeSlotScheduler>,
    /// Notification bus for booking and slot changes.
    pub event_bus: SharedEventBus,
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    /// The configuration the service was started with.
    pub config: AppConfig,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    maintenance_task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Start the booking service.
    ///
    /// This will:
    /// 1. Connect to the database and run migrations
    /// 2. Build the booking and scheduler services
    /// 3. Backfill the time slot window (if enabled)
    /// 4. Start the daily maintenance task (if enabled)
    pub async fn start(opts: ServerOptions) -> Result<Self, AppError> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting EV slot booking service...");

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database.connection())
            .await
            .map_err(InfraError::from)?;

        // ── Repositories & Services ────────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let event_bus = create_event_bus();
        info!("🔔 Event bus initialized for booking notifications");

        let bookings = Arc::new(BookingService::new(
            repos.clone(),
            opts.clock.clone(),
            event_bus.clone(),
            Arc::new(PayloadQrRenderer::new(app_cfg.booking.checkin_base_uri.clone())),
            app_cfg.booking.policy(),
        ));

        let plan = app_cfg.scheduler.plan()?;
        let scheduler = Arc::new(TimeSlotScheduler::new(
            repos.clone(),
            opts.clock,
            plan,
            event_bus.clone(),
        ));

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);

        // ── Background tasks ───────────────────────────────────
        let maintenance_task = if app_cfg.scheduler.enabled {
            if app_cfg.scheduler.backfill_on_start {
                if let Err(e) = scheduler.ensure_window().await {
                    error!(error = %e, "Time slot backfill failed, continuing with stored window");
                }
            }
            Some(start_maintenance_task(scheduler.clone(), shutdown.signal()))
        } else {
            info!("Time slot scheduler disabled by configuration");
            None
        };

        info!("🚀 EV slot booking service started.");

        Ok(Self {
            bookings,
            scheduler,
            event_bus,
            repos,
            config: app_cfg,
            db,
            shutdown,
            maintenance_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Block until shutdown is triggered, then stop background tasks and
    /// close the database within the configured timeout.
    pub async fn run_until_shutdown(self) {
        let Self {
            db,
            shutdown,
            maintenance_task,
            ..
        } = self;

        shutdown
            .shutdown_with_cleanup(|| async move {
                if let Some(task) = maintenance_task {
                    if let Err(e) = task.await {
                        error!("Maintenance task panicked: {}", e);
                    }
                }

                info!("🧹 Performing final cleanup...");
                if let Err(e) = db.close().await {
                    warn!("Error closing database connection: {}", e);
                } else {
                    info!("✅ Database connection closed");
                }
            })
            .await;

        info!("👋 EV slot booking service shutdown complete");
    }

    /// Trigger shutdown and wait for everything to stop.
    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.run_until_shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Slot, Station};
    use crate::shared::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn options(clock: ManualClock) -> ServerOptions {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.server.shutdown_timeout = 5;
        ServerOptions {
            config,
            clock: Arc::new(clock),
        }
    }

    #[tokio::test]
    async fn start_book_and_shut_down() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let handle = ServerHandle::start(options(ManualClock::new(now)))
            .await
            .expect("server should start");

        handle.repos.stations().save(Station::new("S1", 1)).await.unwrap();
        handle
            .repos
            .slots()
            .save(Slot::new("S1-1", "S1", "CCS"))
            .await
            .unwrap();

        let start = now + Duration::hours(20);
        let booking = handle
            .bookings
            .create_booking("S1", "CCS", start, start + Duration::hours(2), "owner-1")
            .await
            .unwrap();
        assert_eq!(booking.slot_id, "S1-1");

        // the startup backfill ran before any slot existed, so the window
        // is filled on the next pass
        let report = handle.scheduler.ensure_window().await.unwrap();
        assert_eq!(report.days_added.len(), 7);
        assert_eq!(report.generated, 70);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown should complete");
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_at_start() {
        let mut opts = options(ManualClock::new(Utc::now()));
        opts.config.scheduler.timezone = "Nowhere/Void".to_string();
        assert!(ServerHandle::start(opts).await.is_err());
    }
}
