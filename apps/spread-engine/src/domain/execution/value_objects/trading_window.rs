//! Trading Window
//!
//! Local-time window in which a scheduled run may trade. Runs started
//! outside it are skipped before the signal is read.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use thiserror::Error;

/// Trading window errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradingWindowError {
    /// Bound is not `HH:MM` or `HH:MM:SS`.
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    /// Not an IANA zone name.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// End precedes start.
    #[error("Window end {end} is before start {start}")]
    Inverted {
        /// Opening bound.
        start: NaiveTime,
        /// Closing bound.
        end: NaiveTime,
    },
}

/// Inclusive `[start, end]` window in a named timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    start: NaiveTime,
    end: NaiveTime,
    timezone: Tz,
    weekdays_only: bool,
}

impl TradingWindow {
    /// Build a window from config strings.
    pub fn parse(
        start: &str,
        end: &str,
        timezone: &str,
        weekdays_only: bool,
    ) -> Result<Self, TradingWindowError> {
        let start = parse_time(start)?;
        let end = parse_time(end)?;
        if end < start {
            return Err(TradingWindowError::Inverted { start, end });
        }
        let timezone = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| TradingWindowError::InvalidTimezone(timezone.to_string()))?;
        Ok(Self {
            start,
            end,
            timezone,
            weekdays_only,
        })
    }

    /// True when `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.timezone);
        if self.weekdays_only && matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = local.time();
        self.start <= time && time <= self.end
    }

    /// `at` rendered in the window's timezone, for logs and audit.
    #[must_use]
    pub fn local_label(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format("%a %H:%M:%S %Z")
            .to_string()
    }
}

impl std::fmt::Display for TradingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{} {}",
            self.start.format("%H:%M:%S"),
            self.end.format("%H:%M:%S"),
            self.timezone
        )?;
        if self.weekdays_only {
            write!(f, " weekdays")?;
        }
        Ok(())
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, TradingWindowError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| TradingWindowError::InvalidTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn close_window() -> TradingWindow {
        TradingWindow::parse("16:08", "16:14", "America/New_York", true).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    // 2025-12-18 is a Thursday; New York is UTC-5 in December.
    #[test_case(utc(2025, 12, 18, 21, 8), true ; "opening minute")]
    #[test_case(utc(2025, 12, 18, 21, 14), true ; "closing minute")]
    #[test_case(utc(2025, 12, 18, 21, 7), false ; "one minute early")]
    #[test_case(utc(2025, 12, 18, 21, 15), false ; "one minute late")]
    #[test_case(utc(2025, 12, 20, 21, 10), false ; "saturday")]
    #[test_case(utc(2025, 7, 17, 20, 10), true ; "daylight saving time")]
    fn close_window_membership(at: DateTime<Utc>, inside: bool) {
        assert_eq!(close_window().contains(at), inside);
    }

    #[test]
    fn weekends_allowed_when_not_weekdays_only() {
        let w = TradingWindow::parse("16:08:00", "16:14:00", "America/New_York", false).unwrap();
        assert!(w.contains(utc(2025, 12, 20, 21, 10)));
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(matches!(
            TradingWindow::parse("4pm", "16:14", "America/New_York", true),
            Err(TradingWindowError::InvalidTime(_))
        ));
        assert!(matches!(
            TradingWindow::parse("16:08", "16:14", "Mars/Olympus", true),
            Err(TradingWindowError::InvalidTimezone(_))
        ));
        assert!(matches!(
            TradingWindow::parse("16:14", "16:08", "America/New_York", true),
            Err(TradingWindowError::Inverted { .. })
        ));
    }

    #[test]
    fn label_is_local_time() {
        assert_eq!(close_window().local_label(utc(2025, 12, 18, 21, 9)), "Thu 16:09:00 EST");
    }
}
