use crate::error::SelectionError;
use chrono::{DateTime, Duration, Utc};

/// Tracks when universe selection is next due.
///
/// Starts at the minimum representable time so the first poll is always due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSchedule {
    next_refresh_time_utc: DateTime<Utc>,
    refresh_interval: Duration,
}

impl RefreshSchedule {
    /// Negative intervals are rejected with [`SelectionError::Config`]
    pub fn new(refresh_interval: Duration) -> Result<Self, SelectionError> {
        if refresh_interval < Duration::zero() {
            return Err(SelectionError::Config(format!(
                "refresh interval must not be negative, got {refresh_interval}"
            )));
        }
        Ok(Self { next_refresh_time_utc: DateTime::<Utc>::MIN_UTC, refresh_interval })
    }

    pub fn next_refresh_time_utc(&self) -> DateTime<Utc> {
        self.next_refresh_time_utc
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_refresh_time_utc
    }

    /// Set the next refresh to `now + refresh_interval`, saturating at the maximum time
    pub fn advance(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_refresh_time_utc =
            now.checked_add_signed(self.refresh_interval).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.next_refresh_time_utc
    }
}
