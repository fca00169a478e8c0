//! Booking time-range rules
//!
//! Creation: `start < end`, `now <= start <= now + horizon`.
//! Update/cancel: allowed only while `now < start - cutoff`.

use chrono::{DateTime, Duration, Utc};

use super::BookingPolicy;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy)]
pub struct TimeWindowPolicy {
    horizon: Duration,
    modify_cutoff: Duration,
}

impl TimeWindowPolicy {
    pub fn new(horizon: Duration, modify_cutoff: Duration) -> Self {
        Self {
            horizon,
            modify_cutoff,
        }
    }

    pub fn check_create(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if start >= end {
            return Err(DomainError::InvalidRange { start, end });
        }
        if start < now {
            return Err(DomainError::OutOfWindow {
                start,
                reason: "start is in the past",
            });
        }
        if start > now + self.horizon {
            return Err(DomainError::OutOfWindow {
                start,
                reason: "start is beyond the booking horizon",
            });
        }
        Ok(())
    }

    pub fn cutoff(&self, booking_start: DateTime<Utc>) -> DateTime<Utc> {
        booking_start - self.modify_cutoff
    }

    pub fn check_modify(&self, booking_start: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
        let cutoff = self.cutoff(booking_start);
        if now >= cutoff {
            return Err(DomainError::TooLateToModify { cutoff });
        }
        Ok(())
    }
}

impl From<&BookingPolicy> for TimeWindowPolicy {
    fn from(policy: &BookingPolicy) -> Self {
        Self::new(policy.horizon, policy.modify_cutoff)
    }
}

impl Default for TimeWindowPolicy {
    fn default() -> Self {
        Self::from(&BookingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn accepts_range_inside_window() {
        let policy = TimeWindowPolicy::default();
        let start = now() + Duration::hours(2);
        assert!(policy.check_create(start, start + Duration::hours(1), now()).is_ok());
    }

    #[test]
    fn start_equal_to_now_is_allowed() {
        let policy = TimeWindowPolicy::default();
        assert!(policy
            .check_create(now(), now() + Duration::hours(1), now())
            .is_ok());
    }

    #[test]
    fn rejects_inverted_or_empty_range() {
        let policy = TimeWindowPolicy::default();
        let start = now() + Duration::hours(2);
        assert!(matches!(
            policy.check_create(start, start, now()),
            Err(DomainError::InvalidRange { .. })
        ));
        assert!(matches!(
            policy.check_create(start, start - Duration::minutes(1), now()),
            Err(DomainError::InvalidRange { .. })
        ));
    }

    #[test]
    fn rejects_past_start() {
        let policy = TimeWindowPolicy::default();
        let start = now() - Duration::seconds(1);
        assert!(matches!(
            policy.check_create(start, now() + Duration::hours(1), now()),
            Err(DomainError::OutOfWindow { .. })
        ));
    }

    #[test]
    fn horizon_boundary() {
        let policy = TimeWindowPolicy::default();
        let edge = now() + Duration::days(7);
        assert!(policy.check_create(edge, edge + Duration::hours(1), now()).is_ok());

        let past_edge = edge + Duration::seconds(1);
        assert!(matches!(
            policy.check_create(past_edge, past_edge + Duration::hours(1), now()),
            Err(DomainError::OutOfWindow { .. })
        ));
    }

    #[test]
    fn cutoff_boundary_is_exclusive() {
        let policy = TimeWindowPolicy::default();
        let start = now() + Duration::hours(13);
        let cutoff = start - Duration::hours(12);

        assert!(policy.check_modify(start, cutoff - Duration::seconds(1)).is_ok());
        match policy.check_modify(start, cutoff) {
            Err(DomainError::TooLateToModify { cutoff: reported }) => assert_eq!(reported, cutoff),
            other => panic!("expected TooLateToModify, got {:?}", other),
        }
        assert!(policy.check_modify(start, cutoff + Duration::minutes(5)).is_err());
    }

    proptest! {
        #[test]
        fn accepted_starts_stay_inside_horizon(
            start_offset_secs in -86_400i64..(9 * 86_400),
            length_secs in 1i64..(6 * 3_600),
        ) {
            let policy = TimeWindowPolicy::default();
            let start = now() + Duration::seconds(start_offset_secs);
            let end = start + Duration::seconds(length_secs);

            let accepted = policy.check_create(start, end, now()).is_ok();
            let inside = start >= now() && start <= now() + Duration::days(7);
            prop_assert_eq!(accepted, inside);
        }

        #[test]
        fn modify_allowed_iff_before_cutoff(
            start_offset_mins in 0i64..(7 * 24 * 60),
            now_offset_mins in 0i64..(7 * 24 * 60),
        ) {
            let policy = TimeWindowPolicy::default();
            let start = now() + Duration::minutes(start_offset_mins);
            let at = now() + Duration::minutes(now_offset_mins);

            let allowed = policy.check_modify(start, at).is_ok();
            prop_assert_eq!(allowed, at < start - Duration::hours(12));
        }
    }
}
