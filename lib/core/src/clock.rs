use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Time source for services.
///
/// All business code reads time through this trait so that tests can pin
/// and advance the clock. Durations derived from stored timestamps (cook
/// time, pause gaps) stay reproducible that way.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as an RFC 3339 string, the storage format for timestamps.
    fn now_rfc3339(&self) -> String {
        self.now().to_rfc3339()
    }

    /// Current calendar date as `YYYY-MM-DD`, the shift-date key format.
    fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }
}

/// Wall-clock time. The default in daemons.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Pinned clock for tests. Starts at a fixed instant and only moves when told.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Pin the clock at `ts`.
    ///
    /// Panics if `ts` is not RFC 3339; this is a test fixture.
    pub fn at(ts: &str) -> Self {
        let t = DateTime::parse_from_rfc3339(ts)
            .expect("FixedClock::at expects an RFC 3339 timestamp")
            .with_timezone(&Utc);
        Self { now: Mutex::new(t) }
    }

    /// Move the clock forward.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }

    /// Jump the clock to a new instant.
    ///
    /// Panics if `ts` is not RFC 3339.
    pub fn set(&self, ts: &str) {
        let t = DateTime::parse_from_rfc3339(ts)
            .expect("FixedClock::set expects an RFC 3339 timestamp")
            .with_timezone(&Utc);
        *self.now.lock().unwrap() = t;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::at("2024-03-01T08:00:00+00:00");
        assert_eq!(clock.now_rfc3339(), "2024-03-01T08:00:00+00:00");
        clock.advance_secs(90);
        assert_eq!(clock.now_rfc3339(), "2024-03-01T08:01:30+00:00");
    }

    #[test]
    fn test_today_is_calendar_date() {
        let clock = FixedClock::at("2024-03-01T23:59:59+00:00");
        assert_eq!(clock.today(), "2024-03-01");
        clock.advance_secs(1);
        assert_eq!(clock.today(), "2024-03-02");
    }

    #[test]
    fn test_system_clock_ticks() {
        let clock = SystemClock;
        let ts = clock.now_rfc3339();
        assert!(ts.contains('T'));
    }
}
