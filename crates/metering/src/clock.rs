//! Clock & calendar capability (spec.md §4.K): one process-wide
//! abstraction over wall time so tests replace `now()` with a fixed
//! instant instead of racing the real clock.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use model_meter_domain::DayKey;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("unknown IANA timezone: {0}")]
    UnknownTimezone(String),
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Computes the `YYYYMMDD` day-key for `instant` as observed in `tz`.
    fn day_in(&self, tz: &str, instant: DateTime<Utc>) -> Result<DayKey, ClockError> {
        let zone = Tz::from_str(tz).map_err(|_| ClockError::UnknownTimezone(tz.to_string()))?;
        let local = instant.with_timezone(&zone);
        Ok(DayKey::from_date(local.date_naive()))
    }
}

/// Production clock: reads the real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock pinned to a fixed instant, for deterministic day-boundary
/// and timestamp-validation tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_in_crosses_midnight_utc_but_not_local() {
        // 2026-07-26T02:00:00Z is still 2026-07-25 in America/New_York (UTC-4 in July).
        let instant = Utc.with_ymd_and_hms(2026, 7, 26, 2, 0, 0).unwrap();
        let clock = FixedClock(instant);
        let key = clock.day_in("America/New_York", instant).unwrap();
        assert_eq!(key.date().format("%Y-%m-%d").to_string(), "2026-07-25");
    }

    #[test]
    fn rejects_unknown_timezone() {
        let clock = FixedClock(Utc::now());
        assert!(clock.day_in("Not/A_Zone", Utc::now()).is_err());
    }
}
