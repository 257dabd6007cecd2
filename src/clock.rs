use chrono::{Local, NaiveDateTime, Timelike, Utc};

/// Wall-clock source. Predictions depend on the local hour, so the clock
/// is handed to the engine instead of being read ad hoc.
pub trait Clock: Send + Sync {
    /// Local wall-clock time
    fn now(&self) -> NaiveDateTime;

    /// Seconds since the Unix epoch
    fn unix_timestamp(&self) -> i64;

    fn hour(&self) -> u32 {
        self.now().hour()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn unix_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock frozen at one instant. The instant doubles as UTC for timestamps.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

#[cfg(test)]
impl FixedClock {
    /// Midnight-based instant on an arbitrary day at the given hour
    pub fn at_hour(hour: u32) -> Self {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(hour % 24, 0, 0))
            .unwrap_or_default();
        Self(at)
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }

    fn unix_timestamp(&self) -> i64 {
        self.0.and_utc().timestamp()
    }
}

/// ISO 8601 without offset, microsecond precision (e.g. 2024-06-01T12:00:00.000000)
pub fn isoformat(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_hour() {
        for hour in 0..24 {
            assert_eq!(FixedClock::at_hour(hour).hour(), hour);
        }
    }

    #[test]
    fn test_fixed_clock_timestamp() {
        let clock = FixedClock::at_hour(0);
        // 2024-06-01T00:00:00Z
        assert_eq!(clock.unix_timestamp(), 1_717_200_000);
    }

    #[test]
    fn test_isoformat() {
        let clock = FixedClock::at_hour(12);
        assert_eq!(isoformat(clock.now()), "2024-06-01T12:00:00.000000");
    }
}
