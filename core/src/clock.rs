use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Source of "now" for anything that depends on the time of day.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock pinned to one instant. Used by tests and by `--at` style overrides.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Storage form for timestamps: RFC 3339 in UTC with microseconds and a `Z`
/// suffix, so string order matches time order.
#[must_use]
pub fn timestamp<Tz: chrono::TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_is_utc_and_sortable() {
        let a = Utc.with_ymd_and_hms(2024, 6, 15, 9, 5, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        assert_eq!(timestamp(&a), "2024-06-15T09:05:00.000000Z");
        assert!(timestamp(&a) < timestamp(&b));
    }

    #[test]
    fn test_fixed_clock() {
        let at = Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(FixedClock(at).now(), at);
    }
}
