//! # clock — wall-clock source
//!
//! The controller never calls `Utc::now()` directly so a cycle can be driven
//! with a simulated clock in tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `now` expressed in the trading time zone.
pub fn local(now: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    tz.from_utc_datetime(&now.naive_utc())
}

/// Calendar window for the bar request: `lookback_days` ago up to yesterday,
/// both as local dates.
pub fn bar_window(now: DateTime<Utc>, tz: Tz, lookback_days: i64) -> (NaiveDate, NaiveDate) {
    let today = local(now, tz).date_naive();
    let start = today - chrono::Duration::days(lookback_days);
    let end = today - chrono::Duration::days(1);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn local_time_follows_dst() {
        // 14:00 UTC is 10:00 in New York during DST, 09:00 in winter
        let summer = Utc.with_ymd_and_hms(2024, 7, 1, 14, 0, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 8, 14, 0, 0).unwrap();
        assert_eq!(local(summer, chrono_tz::US::Eastern).hour(), 10);
        assert_eq!(local(winter, chrono_tz::US::Eastern).hour(), 9);
    }

    #[test]
    fn bar_window_uses_local_date() {
        // 02:00 UTC on the 10th is still the 9th in New York
        let now = Utc.with_ymd_and_hms(2024, 7, 10, 2, 0, 0).unwrap();
        let (start, end) = bar_window(now, chrono_tz::US::Eastern, 31);
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 7, 8).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 8).unwrap());
    }
}
