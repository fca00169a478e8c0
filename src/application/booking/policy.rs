use chrono::Duration;

/// Tunable limits of the booking rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Latest allowed start, measured from now
    pub horizon: Duration,
    /// Update/cancel must happen strictly before `start - modify_cutoff`
    pub modify_cutoff: Duration,
    /// Upper bound on check-in token lifetime
    pub qr_ttl: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            horizon: Duration::days(7),
            modify_cutoff: Duration::hours(12),
            qr_ttl: Duration::minutes(15),
        }
    }
}
