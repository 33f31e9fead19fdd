use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Whether an entry fetched at `fetched_at` is still within `ttl` at `now`.
///
/// A non-positive TTL is never fresh. Clock skew is not compensated: an
/// entry stamped in the future counts as fresh.
pub fn is_fresh(fetched_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    if ttl <= Duration::zero() {
        return false;
    }
    now - fetched_at < ttl
}

/// Source of "now" for freshness checks and new entry timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Millisecond resolution.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Start at the given number of milliseconds since the Unix epoch.
    pub fn at_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_fresh_strictly_inside_ttl() {
        let ttl = Duration::milliseconds(600_000);
        assert!(is_fresh(at(0), ttl, at(0)));
        assert!(is_fresh(at(0), ttl, at(599_999)));
    }

    #[test]
    fn test_stale_at_exact_boundary() {
        let ttl = Duration::milliseconds(600_000);
        assert!(!is_fresh(at(0), ttl, at(600_000)));
        assert!(!is_fresh(at(0), ttl, at(700_000)));
    }

    #[test]
    fn test_non_positive_ttl_is_never_fresh() {
        assert!(!is_fresh(at(1_000), Duration::zero(), at(1_000)));
        assert!(!is_fresh(at(1_000), Duration::milliseconds(-5), at(1_000)));
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let ttl = Duration::minutes(10);
        assert!(is_fresh(at(10_000), ttl, at(0)));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::at_millis(0);
        assert_eq!(clock.now().timestamp_millis(), 0);
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now().timestamp_millis(), 5_000);
        clock.set_millis(700_000);
        assert_eq!(clock.now(), at(700_000));
    }
}
