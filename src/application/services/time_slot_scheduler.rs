//! Rolling window of time slots
//!
//! Each daily run drops yesterday's windows and materializes the day that
//! just entered the horizon, so the store always covers `window_days`
//! local calendar days starting today.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::events::{Event, MaintenanceCompletedEvent, SharedEventBus};
use crate::domain::{DomainError, DomainResult, RepositoryProvider, TimeSlot};
use crate::shared::clock::SharedClock;

/// Resolved scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    pub timezone: Tz,
    /// Local time of day the daily run fires
    pub run_at: NaiveTime,
    /// Local session start times, sorted
    pub start_times: Vec<NaiveTime>,
    pub session_length: Duration,
    pub window_days: u32,
}

impl SchedulePlan {
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// UTC instant of a local wall-clock time. `None` inside a DST gap; the
    /// earlier instant when the local time is ambiguous.
    pub fn local_to_utc(&self, day: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&day.and_time(time))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Half-open UTC range `[start of day, start of next day)` of a local day
    pub fn day_bounds(&self, day: NaiveDate) -> DomainResult<(DateTime<Utc>, DateTime<Utc>)> {
        let next = day
            .succ_opt()
            .ok_or_else(|| DomainError::Validation(format!("no day after {}", day)))?;
        Ok((self.start_of_day(day)?, self.start_of_day(next)?))
    }

    // Some zones skip local midnight on DST days; the day then starts at
    // the first local hour that exists.
    fn start_of_day(&self, day: NaiveDate) -> DomainResult<DateTime<Utc>> {
        (0..24)
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .find_map(|time| self.local_to_utc(day, time))
            .ok_or_else(|| {
                DomainError::Validation(format!("{} has no start in {}", day, self.timezone))
            })
    }

    /// Next instant strictly after `now` at which the daily run is due
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.today(now);
        (0..=2)
            .filter_map(|offset| today.checked_add_days(chrono::Days::new(offset)))
            .filter_map(|day| self.local_to_utc(day, self.run_at))
            .find(|at| *at > now)
            .unwrap_or_else(|| now + Duration::days(1))
    }
}

/// Outcome of one daily run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub deleted_day: NaiveDate,
    pub deleted: usize,
    pub added_day: NaiveDate,
    pub generated: usize,
    /// The add-day already had windows, nothing was generated
    pub skipped: bool,
}

/// Outcome of the startup pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackfillReport {
    pub purged: usize,
    pub days_added: Vec<NaiveDate>,
    pub generated: usize,
}

pub struct TimeSlotScheduler {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    plan: SchedulePlan,
    events: SharedEventBus,
    running: Mutex<()>,
}

impl TimeSlotScheduler {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        plan: SchedulePlan,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            clock,
            plan,
            events,
            running: Mutex::new(()),
        }
    }

    pub fn plan(&self) -> &SchedulePlan {
        &self.plan
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Delete yesterday, add `today + window_days - 1`.
    ///
    /// A failure part way leaves whatever was already written in place; the
    /// next run picks up from the stored state.
    pub async fn run_daily_maintenance(&self) -> DomainResult<MaintenanceReport> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| DomainError::MaintenanceInProgress)?;

        let result = self.rotate_window().await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::counter!("maintenance_runs_total", "outcome" => outcome).increment(1);
        result
    }

    async fn rotate_window(&self) -> DomainResult<MaintenanceReport> {
        let now = self.clock.now();
        let today = self.plan.today(now);
        let deleted_day = today - Duration::days(1);
        let added_day = today + Duration::days(i64::from(self.plan.window_days) - 1);

        let (from, to) = self.plan.day_bounds(deleted_day)?;
        let deleted_ids = self
            .repos
            .time_slots()
            .delete_starting_between(from, to)
            .await?;
        if !deleted_ids.is_empty() {
            self.repos.slots().detach_time_slots(&deleted_ids).await?;
        }

        let generated = self.generate_day(added_day).await?;
        let report = MaintenanceReport {
            deleted_day,
            deleted: deleted_ids.len(),
            added_day,
            generated: generated.unwrap_or(0),
            skipped: generated.is_none(),
        };

        info!(
            %deleted_day,
            deleted = report.deleted,
            %added_day,
            generated = report.generated,
            skipped = report.skipped,
            "🗓️ Time slot window rotated"
        );
        self.events
            .publish(Event::MaintenanceCompleted(MaintenanceCompletedEvent {
                deleted_day,
                deleted: report.deleted,
                added_day,
                generated: report.generated,
                timestamp: now,
            }));

        Ok(report)
    }

    /// Purge everything before today and fill every missing day of the
    /// window. Used at startup to converge after downtime.
    pub async fn ensure_window(&self) -> DomainResult<BackfillReport> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| DomainError::MaintenanceInProgress)?;

        let today = self.plan.today(self.clock.now());
        let (today_start, _) = self.plan.day_bounds(today)?;

        let purged = self
            .repos
            .time_slots()
            .delete_starting_before(today_start)
            .await?;
        if !purged.is_empty() {
            self.repos.slots().detach_time_slots(&purged).await?;
        }

        let mut report = BackfillReport {
            purged: purged.len(),
            ..Default::default()
        };
        for offset in 0..i64::from(self.plan.window_days) {
            let day = today + Duration::days(offset);
            if let Some(count) = self.generate_day(day).await? {
                report.days_added.push(day);
                report.generated += count;
            }
        }

        info!(
            purged = report.purged,
            days_added = report.days_added.len(),
            generated = report.generated,
            "🗓️ Time slot window backfilled"
        );
        Ok(report)
    }

    /// Windows of one slot on a local calendar day, ordered by start
    pub async fn time_slots_by_date(
        &self,
        station_id: &str,
        slot_id: &str,
        date: NaiveDate,
    ) -> DomainResult<Vec<TimeSlot>> {
        let (from, to) = self.plan.day_bounds(date)?;
        self.repos
            .time_slots()
            .find_for_slot_between(station_id, slot_id, from, to)
            .await
    }

    /// Materialize one day for every slot. `None` when the day already has
    /// windows.
    async fn generate_day(&self, day: NaiveDate) -> DomainResult<Option<usize>> {
        let (from, to) = self.plan.day_bounds(day)?;
        if self
            .repos
            .time_slots()
            .exists_starting_between(from, to)
            .await?
        {
            debug!(%day, "Time slots already present, skipping generation");
            return Ok(None);
        }

        let starts: Vec<DateTime<Utc>> = self
            .plan
            .start_times
            .iter()
            .filter_map(|time| {
                let start = self.plan.local_to_utc(day, *time);
                if start.is_none() {
                    warn!(%day, %time, timezone = %self.plan.timezone, "Session start falls in a DST gap, skipping");
                }
                start
            })
            .collect();

        let slots = self.repos.slots().find_all().await?;
        let mut generated = 0;
        for slot in slots {
            let batch: Vec<TimeSlot> = starts
                .iter()
                .map(|start| {
                    TimeSlot::new(&slot.station_id, &slot.id, *start, self.plan.session_length)
                })
                .collect();
            let ids: Vec<String> = batch.iter().map(|ts| ts.id.clone()).collect();

            self.repos.time_slots().insert_many(batch).await?;
            self.repos.slots().append_time_slots(&slot.id, &ids).await?;
            generated += ids.len();
        }

        metrics::counter!("time_slots_generated_total").increment(generated as u64);
        debug!(%day, generated, "Time slots generated");
        Ok(Some(generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::config::SchedulerConfig;
    use crate::domain::{Slot, Station};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::clock::{Clock, ManualClock};
    use std::collections::BTreeSet;

    fn plan_in(timezone: &str) -> SchedulePlan {
        SchedulerConfig {
            timezone: timezone.to_string(),
            ..Default::default()
        }
        .plan()
        .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn scheduler(plan: SchedulePlan, now: DateTime<Utc>) -> (Arc<InMemoryRepositoryProvider>, ManualClock, TimeSlotScheduler) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        repos.stations().save(Station::new("S1", 2)).await.unwrap();
        repos.slots().save(Slot::new("slot-1", "S1", "CCS")).await.unwrap();
        repos.slots().save(Slot::new("slot-2", "S1", "Type2")).await.unwrap();

        let clock = ManualClock::new(now);
        let scheduler =
            TimeSlotScheduler::new(repos.clone(), Arc::new(clock.clone()), plan, create_event_bus());
        (repos, clock, scheduler)
    }

    async fn days_present(repos: &InMemoryRepositoryProvider, plan: &SchedulePlan) -> BTreeSet<NaiveDate> {
        repos
            .time_slots()
            .find_starting_between(at(2000, 1, 1, 0, 0), at(2100, 1, 1, 0, 0))
            .await
            .unwrap()
            .iter()
            .map(|ts| plan.today(ts.start_time))
            .collect()
    }

    #[test]
    fn next_run_is_later_today_or_tomorrow() {
        let plan = plan_in("UTC");
        assert_eq!(plan.next_run_after(at(2025, 3, 1, 12, 0)), at(2025, 3, 2, 0, 0));
        // exactly at run time: the next run is a day later
        assert_eq!(plan.next_run_after(at(2025, 3, 2, 0, 0)), at(2025, 3, 3, 0, 0));

        let kolkata = plan_in("Asia/Kolkata");
        // 00:00 IST is 18:30 UTC the previous day
        assert_eq!(kolkata.next_run_after(at(2025, 3, 1, 12, 0)), at(2025, 3, 1, 18, 30));
    }

    #[test]
    fn day_bounds_follow_the_zone() {
        let plan = plan_in("Asia/Kolkata");
        let (from, to) = plan.day_bounds(date(2025, 3, 2)).unwrap();
        assert_eq!(from, at(2025, 3, 1, 18, 30));
        assert_eq!(to, at(2025, 3, 2, 18, 30));
    }

    #[test]
    fn dst_gap_start_is_unresolvable() {
        let plan = plan_in("Europe/Berlin");
        // clocks jump 02:00 -> 03:00 on 2025-03-30
        let gap = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        assert!(plan.local_to_utc(date(2025, 3, 30), gap).is_none());
        assert!(plan.local_to_utc(date(2025, 3, 31), gap).is_some());
    }

    #[tokio::test]
    async fn daily_run_generates_add_day_for_every_slot() {
        let plan = plan_in("UTC");
        let (repos, _clock, scheduler) = scheduler(plan.clone(), at(2025, 3, 1, 0, 0)).await;

        let report = scheduler.run_daily_maintenance().await.unwrap();
        assert_eq!(report.deleted_day, date(2025, 2, 28));
        assert_eq!(report.added_day, date(2025, 3, 7));
        assert_eq!(report.generated, 20);
        assert!(!report.skipped);

        let windows = scheduler
            .time_slots_by_date("S1", "slot-1", date(2025, 3, 7))
            .await
            .unwrap();
        assert_eq!(windows.len(), 10);
        assert_eq!(windows[0].start_time, at(2025, 3, 7, 1, 15));
        assert_eq!(windows[9].start_time, at(2025, 3, 7, 21, 30));
        assert!(windows
            .iter()
            .all(|w| w.end_time - w.start_time == Duration::minutes(120)));

        let slot = repos.slots().find_by_id("slot-1").await.unwrap().unwrap();
        assert_eq!(slot.time_slot_ids.len(), 10);
    }

    #[tokio::test]
    async fn second_run_on_same_day_adds_nothing() {
        let plan = plan_in("UTC");
        let (repos, _clock, scheduler) = scheduler(plan, at(2025, 3, 1, 0, 0)).await;

        scheduler.run_daily_maintenance().await.unwrap();
        let again = scheduler.run_daily_maintenance().await.unwrap();
        assert!(again.skipped);
        assert_eq!(again.generated, 0);

        let windows = scheduler
            .time_slots_by_date("S1", "slot-2", date(2025, 3, 7))
            .await
            .unwrap();
        assert_eq!(windows.len(), 10);
        let slot = repos.slots().find_by_id("slot-2").await.unwrap().unwrap();
        assert_eq!(slot.time_slot_ids.len(), 10);
    }

    #[tokio::test]
    async fn consecutive_runs_keep_seven_days() {
        let plan = plan_in("UTC");
        let (repos, clock, scheduler) = scheduler(plan.clone(), at(2025, 3, 1, 0, 0)).await;

        for _ in 0..10 {
            scheduler.run_daily_maintenance().await.unwrap();
            clock.advance(Duration::days(1));
        }
        clock.advance(Duration::days(-1));

        let today = plan.today(clock.now());
        let days = days_present(&repos, &plan).await;
        assert_eq!(days.len(), 7);
        assert!(!days.contains(&(today - Duration::days(1))));
        assert_eq!(days.first(), Some(&today));
        assert_eq!(days.last(), Some(&(today + Duration::days(6))));

        // slot reference lists track the surviving windows only
        let slot = repos.slots().find_by_id("slot-1").await.unwrap().unwrap();
        assert_eq!(slot.time_slot_ids.len(), 70);
    }

    #[tokio::test]
    async fn ensure_window_backfills_and_purges() {
        let plan = plan_in("UTC");
        let (repos, clock, scheduler) = scheduler(plan.clone(), at(2025, 3, 1, 9, 0)).await;

        let first = scheduler.ensure_window().await.unwrap();
        assert_eq!(first.days_added.len(), 7);
        assert_eq!(first.generated, 7 * 20);
        assert_eq!(days_present(&repos, &plan).await.len(), 7);

        // three days of downtime
        clock.advance(Duration::days(3));
        let second = scheduler.ensure_window().await.unwrap();
        assert_eq!(second.purged, 3 * 20);
        assert_eq!(
            second.days_added,
            vec![date(2025, 3, 8), date(2025, 3, 9), date(2025, 3, 10)]
        );

        let days = days_present(&repos, &plan).await;
        assert_eq!(days.len(), 7);
        assert_eq!(days.first(), Some(&date(2025, 3, 4)));
    }

    #[tokio::test]
    async fn dst_gap_sessions_are_skipped() {
        let mut plan = plan_in("America/New_York");
        plan.start_times = vec![
            NaiveTime::from_hms_opt(1, 15, 0).unwrap(),
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(3, 30, 0).unwrap(),
        ];
        // 2025-03-09 is the spring-forward day; it is the add-day of a run
        // on 2025-03-03 local.
        let (_repos, _clock, scheduler) = scheduler(plan, at(2025, 3, 3, 12, 0)).await;

        let report = scheduler.run_daily_maintenance().await.unwrap();
        assert_eq!(report.added_day, date(2025, 3, 9));
        assert_eq!(report.generated, 4);
    }

    #[tokio::test]
    async fn overlapping_run_is_refused() {
        let plan = plan_in("UTC");
        let (_repos, _clock, scheduler) = scheduler(plan, at(2025, 3, 1, 0, 0)).await;

        let _held = scheduler.running.lock().await;
        let err = scheduler.run_daily_maintenance().await.unwrap_err();
        assert!(matches!(err, DomainError::MaintenanceInProgress));
        assert!(matches!(
            scheduler.ensure_window().await,
            Err(DomainError::MaintenanceInProgress)
        ));
    }
}
