//! Background timer driving the daily time slot rotation

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::TimeSlotScheduler;
use crate::shared::ShutdownSignal;

/// Sleep until the configured local run time, rotate, repeat. Errors are
/// logged and the cycle is skipped; the loop exits on shutdown.
pub fn start_maintenance_task(
    scheduler: Arc<TimeSlotScheduler>,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            run_at = %scheduler.plan().run_at,
            timezone = %scheduler.plan().timezone,
            "🗓️ Time slot maintenance task started"
        );

        loop {
            let now = scheduler.clock().now();
            let next_run = scheduler.plan().next_run_after(now);
            let wait = (next_run - now).to_std().unwrap_or_default();
            info!(%next_run, "🗓️ Next time slot maintenance scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    match scheduler.run_daily_maintenance().await {
                        Ok(report) => info!(
                            added_day = %report.added_day,
                            generated = report.generated,
                            deleted = report.deleted,
                            "Daily maintenance finished"
                        ),
                        Err(e) if e.is_transient() => {
                            warn!(error = %e, "Daily maintenance failed, skipping this cycle")
                        }
                        Err(e) => error!(error = %e, "Daily maintenance failed, skipping this cycle"),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("🗓️ Time slot maintenance task shutting down");
                    break;
                }
            }
        }

        info!("🗓️ Time slot maintenance task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::config::SchedulerConfig;
    use crate::domain::{
        BookingRepository, DomainError, DomainResult, RepositoryProvider, Slot, SlotRepository,
        Station, StationRepository, TimeSlot, TimeSlotRepository,
    };
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::clock::{ManualClock, SystemClock};
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn task_stops_on_shutdown() {
        let scheduler = Arc::new(TimeSlotScheduler::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            Arc::new(SystemClock),
            SchedulerConfig::default().plan().unwrap(),
            create_event_bus(),
        ));
        let shutdown = ShutdownSignal::new();
        let handle = start_maintenance_task(scheduler, shutdown.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("task did not stop")
            .expect("task panicked");
    }

    /// Time slot store that fails the first purge and counts every purge.
    struct FlakyTimeSlots {
        inner: Arc<InMemoryRepositoryProvider>,
        purges: AtomicUsize,
    }

    #[async_trait]
    impl TimeSlotRepository for FlakyTimeSlots {
        async fn insert_many(&self, time_slots: Vec<TimeSlot>) -> DomainResult<()> {
            self.inner.time_slots().insert_many(time_slots).await
        }

        async fn exists_starting_between(
            &self,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> DomainResult<bool> {
            self.inner.time_slots().exists_starting_between(from, to).await
        }

        async fn find_starting_between(
            &self,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> DomainResult<Vec<TimeSlot>> {
            self.inner.time_slots().find_starting_between(from, to).await
        }

        async fn find_for_slot_between(
            &self,
            station_id: &str,
            slot_id: &str,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> DomainResult<Vec<TimeSlot>> {
            self.inner
                .time_slots()
                .find_for_slot_between(station_id, slot_id, from, to)
                .await
        }

        async fn delete_starting_between(
            &self,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> DomainResult<Vec<String>> {
            if self.purges.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(DomainError::Transient("database is locked".into()));
            }
            self.inner.time_slots().delete_starting_between(from, to).await
        }

        async fn delete_starting_before(&self, before: DateTime<Utc>) -> DomainResult<Vec<String>> {
            self.inner.time_slots().delete_starting_before(before).await
        }
    }

    struct FlakyProvider {
        inner: Arc<InMemoryRepositoryProvider>,
        time_slots: FlakyTimeSlots,
    }

    impl RepositoryProvider for FlakyProvider {
        fn stations(&self) -> &dyn StationRepository {
            self.inner.stations()
        }

        fn slots(&self) -> &dyn SlotRepository {
            self.inner.slots()
        }

        fn time_slots(&self) -> &dyn TimeSlotRepository {
            &self.time_slots
        }

        fn bookings(&self) -> &dyn BookingRepository {
            self.inner.bookings()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_a_failed_cycle_and_runs_the_next() {
        let inner = Arc::new(InMemoryRepositoryProvider::new());
        inner.stations().save(Station::new("S1", 1)).await.unwrap();
        inner.slots().save(Slot::new("slot-1", "S1", "CCS")).await.unwrap();
        let repos = Arc::new(FlakyProvider {
            inner: inner.clone(),
            time_slots: FlakyTimeSlots {
                inner: inner.clone(),
                purges: AtomicUsize::new(0),
            },
        });

        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());
        let scheduler = Arc::new(TimeSlotScheduler::new(
            repos.clone(),
            Arc::new(clock.clone()),
            SchedulerConfig::default().plan().unwrap(),
            create_event_bus(),
        ));
        let shutdown = ShutdownSignal::new();
        let handle = start_maintenance_task(scheduler.clone(), shutdown.clone());

        // first run is due at midnight UTC, 14h away, and fails
        tokio::time::sleep(Duration::from_secs(14 * 3600 + 60)).await;
        assert_eq!(repos.time_slots.purges.load(Ordering::SeqCst), 1);
        let june_7 = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        assert!(scheduler
            .time_slots_by_date("S1", "slot-1", june_7)
            .await
            .unwrap()
            .is_empty());

        // the loop re-armed for the following midnight
        clock.set(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 30).unwrap());
        tokio::time::sleep(Duration::from_secs(14 * 3600)).await;
        assert_eq!(repos.time_slots.purges.load(Ordering::SeqCst), 2);
        let june_8 = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        assert_eq!(
            scheduler
                .time_slots_by_date("S1", "slot-1", june_8)
                .await
                .unwrap()
                .len(),
            10
        );

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("task did not stop")
            .expect("task panicked");
    }
}
