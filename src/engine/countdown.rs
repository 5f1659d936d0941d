use chrono::{DateTime, Utc};
use serde::Serialize;

/// Time remaining until a target instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeUntil {
    pub is_past: bool,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_seconds: i64,
}

/// Countdown from `now` to `target`.
///
/// A target at or before `now` is past, and how far past is not reported.
pub fn time_until(now: DateTime<Utc>, target: DateTime<Utc>) -> TimeUntil {
    if target <= now {
        return TimeUntil {
            is_past: true,
            ..TimeUntil::default()
        };
    }

    let total_seconds = (target - now).num_milliseconds() / 1000;
    TimeUntil {
        is_past: false,
        hours: total_seconds / 3600,
        minutes: (total_seconds % 3600) / 60,
        seconds: total_seconds % 60,
        total_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_same_instant_is_past() {
        let t = time_until(t0(), t0());
        assert!(t.is_past);
        assert_eq!(t.total_seconds, 0);
    }

    #[test]
    fn test_past_target_discards_magnitude() {
        let t = time_until(t0(), t0() - Duration::hours(5));
        assert_eq!(
            t,
            TimeUntil {
                is_past: true,
                ..TimeUntil::default()
            }
        );
    }

    #[test]
    fn test_decomposes_without_rounding() {
        let target = t0() + Duration::seconds(2 * 3600 + 5 * 60 + 9) + Duration::milliseconds(999);
        let t = time_until(t0(), target);
        assert!(!t.is_past);
        assert_eq!((t.hours, t.minutes, t.seconds), (2, 5, 9));
        assert_eq!(t.total_seconds, 7509);
    }

    #[test]
    fn test_sub_second_future_is_zero_but_not_past() {
        let t = time_until(t0(), t0() + Duration::milliseconds(400));
        assert!(!t.is_past);
        assert_eq!(t.total_seconds, 0);
    }
}
