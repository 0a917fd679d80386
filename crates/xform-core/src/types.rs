//! Time primitives shared across the engine

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Millisecond-precision Unix epoch timestamp
pub type Timestamp = i64;

/// Milliseconds in one day
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Current wall-clock time in milliseconds
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Time range for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start timestamp (inclusive)
    pub start: Timestamp,
    /// End timestamp (exclusive)
    pub end: Timestamp,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Range ending now and reaching `millis` into the past
    pub fn last_millis(millis: i64) -> Self {
        let end = now_millis();
        Self {
            start: end.saturating_sub(millis),
            end,
        }
    }

    /// Reject empty or inverted ranges
    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(CoreError::InvalidTimeRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Get the duration of this range in milliseconds
    pub fn duration_millis(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start: i64::MIN,
            end: i64::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range() {
        let range = TimeRange::new(100, 200);

        assert_eq!(range.duration_millis(), 100);
    }

    #[test]
    fn test_time_range_validation() {
        assert!(TimeRange::new(0, 1000).validate().is_ok());
        assert!(matches!(
            TimeRange::new(1000, 1000).validate(),
            Err(CoreError::InvalidTimeRange { start: 1000, end: 1000 })
        ));
        assert!(TimeRange::new(1000, 0).validate().is_err());
    }

    #[test]
    fn test_default_range_does_not_overflow() {
        let range = TimeRange::default();
        assert_eq!(range.duration_millis(), i64::MAX);
        assert!(range.validate().is_ok());
    }

    #[test]
    fn test_last_millis() {
        let range = TimeRange::last_millis(MILLIS_PER_DAY);
        assert_eq!(range.duration_millis(), MILLIS_PER_DAY);
        assert!(range.validate().is_ok());
    }
}
