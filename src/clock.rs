use time::{Date, OffsetDateTime};

/// Time source injected through `AppState`. Every operation resolves the
/// current instant at the point of use; nothing caches a construction-time
/// timestamp.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;

    fn today_utc(&self) -> Date {
        self.now_utc().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Deterministic clock for tests.
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn fixed_clock_returns_its_instant() {
        let clock = FixedClock(datetime!(2024-03-01 12:30:00 UTC));
        assert_eq!(clock.now_utc(), datetime!(2024-03-01 12:30:00 UTC));
        assert_eq!(clock.today_utc(), datetime!(2024-03-01 12:30:00 UTC).date());
    }
}
