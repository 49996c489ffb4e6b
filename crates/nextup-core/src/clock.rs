//! Time-of-day values and daily recurring windows.
//!
//! [`Time`] is a clock-face value (hour and minute, no date attached).
//! [`TimeWindow`] is an interval between two such values that recurs every
//! day; a window whose start is later than its end wraps past midnight.
//! All wall-clock interpretation happens on the UTC clock face.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TimeParseError;
use crate::range::DateRange;

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2})(?::(\d{2}))?\s*([AaPp][Mm])?\s*$").expect("time pattern compiles")
});

/// A clock-face time of day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Time {
    hour: u32,
    minute: u32,
}

impl Time {
    /// Midnight, the start of the clock face.
    pub const MIDNIGHT: Time = Time { hour: 0, minute: 0 };

    /// Build a time of day from untrusted values.
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeParseError> {
        if hour > 23 {
            return Err(TimeParseError::HourOutOfRange {
                hour,
                convention: "24-hour",
            });
        }
        if minute > 59 {
            return Err(TimeParseError::MinuteOutOfRange(minute));
        }
        Ok(Time { hour, minute })
    }

    /// Build a time of day from known-good values; panics when out of range.
    pub const fn from_hm(hour: u32, minute: u32) -> Self {
        assert!(hour < 24 && minute < 60, "time of day out of range");
        Time { hour, minute }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Offset from midnight.
    pub fn since_midnight(&self) -> Duration {
        Duration::minutes(self.hour as i64 * 60 + self.minute as i64)
    }

    /// The clock-face time of an absolute instant (sub-minute part dropped).
    pub fn of(at: &DateTime<Utc>) -> Self {
        Time {
            hour: at.hour(),
            minute: at.minute(),
        }
    }

    /// This time of day on a specific calendar day, as an absolute instant.
    pub fn on_date(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::MIN).and_utc() + self.since_midnight()
    }
}

impl FromStr for Time {
    type Err = TimeParseError;

    /// Parse `"H[:MM][ ]AM/PM"` (hour 1-12) or 24-hour `"H[:MM]"` (hour 0-23).
    ///
    /// `12 AM` maps to 00 and `12 PM` to 12. An hour that does not fit the
    /// detected convention (`"13 PM"`, `"0 AM"`, `"24:00"`) is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = TIME_RE
            .captures(s)
            .ok_or_else(|| TimeParseError::Unrecognized(s.to_string()))?;
        let hour: u32 = caps[1]
            .parse()
            .map_err(|_| TimeParseError::Unrecognized(s.to_string()))?;
        let minute: u32 = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| TimeParseError::Unrecognized(s.to_string()))?,
            None => 0,
        };
        if minute > 59 {
            return Err(TimeParseError::MinuteOutOfRange(minute));
        }
        match caps.get(3) {
            Some(meridiem) => {
                if !(1..=12).contains(&hour) {
                    return Err(TimeParseError::HourOutOfRange {
                        hour,
                        convention: "12-hour",
                    });
                }
                let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
                let hour = match (hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, false) => h,
                    (h, true) => h + 12,
                };
                Ok(Time { hour, minute })
            }
            None => {
                if hour > 23 {
                    return Err(TimeParseError::HourOutOfRange {
                        hour,
                        convention: "24-hour",
                    });
                }
                Ok(Time { hour, minute })
            }
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A daily recurring clock-time interval.
///
/// When `start > end` the window spans midnight: `22:00-06:00` covers the
/// late evening of one day and the early morning of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: Time,
    end: Time,
}

impl TimeWindow {
    pub fn new(start: Time, end: Time) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn end(&self) -> Time {
        self.end
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether a clock-face time falls inside the window (bounds inclusive).
    pub fn contains(&self, time: Time) -> bool {
        if self.wraps_midnight() {
            time >= self.start || time <= self.end
        } else {
            time >= self.start && time <= self.end
        }
    }

    /// Whether an absolute instant falls inside today's occurrence.
    pub fn is_in_window(&self, at: &DateTime<Utc>) -> bool {
        self.contains(Time::of(at))
    }

    /// Length of one daily occurrence.
    pub fn duration(&self) -> Duration {
        if self.wraps_midnight() {
            Duration::days(1) - (self.start.since_midnight() - self.end.since_midnight())
        } else {
            self.end.since_midnight() - self.start.since_midnight()
        }
    }

    /// The window projected onto a calendar day. A wrapping window ends on
    /// the following day.
    pub fn occurrence_on(&self, date: NaiveDate) -> DateRange {
        let start = self.start.on_date(date);
        let end = if self.wraps_midnight() {
            self.end.on_date(date + Duration::days(1))
        } else {
            self.end.on_date(date)
        };
        DateRange::new(start, end)
    }

    /// The window split into at most two segments that never cross a day
    /// boundary: `(start of segment, length)`. The second segment is empty
    /// for a non-wrapping window.
    pub(crate) fn day_segments(&self) -> [(Time, Duration); 2] {
        if self.wraps_midnight() {
            [
                (
                    self.start,
                    Duration::days(1) - self.start.since_midnight(),
                ),
                (Time::MIDNIGHT, self.end.since_midnight()),
            ]
        } else {
            [
                (
                    self.start,
                    self.end.since_midnight() - self.start.since_midnight(),
                ),
                (Time::MIDNIGHT, Duration::zero()),
            ]
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32, minute: u32) -> Time {
        Time::from_hm(hour, minute)
    }

    #[test]
    fn parse_24_hour() {
        assert_eq!("8".parse::<Time>().unwrap(), t(8, 0));
        assert_eq!("08:30".parse::<Time>().unwrap(), t(8, 30));
        assert_eq!("0:00".parse::<Time>().unwrap(), Time::MIDNIGHT);
        assert_eq!("23:59".parse::<Time>().unwrap(), t(23, 59));
    }

    #[test]
    fn parse_12_hour() {
        assert_eq!("8:30 PM".parse::<Time>().unwrap(), t(20, 30));
        assert_eq!("8:30PM".parse::<Time>().unwrap(), t(20, 30));
        assert_eq!("1 am".parse::<Time>().unwrap(), t(1, 0));
        assert_eq!("12 AM".parse::<Time>().unwrap(), Time::MIDNIGHT);
        assert_eq!("12:15 pm".parse::<Time>().unwrap(), t(12, 15));
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert_eq!(
            "24:00".parse::<Time>(),
            Err(TimeParseError::HourOutOfRange {
                hour: 24,
                convention: "24-hour"
            })
        );
        assert_eq!(
            "8:75".parse::<Time>(),
            Err(TimeParseError::MinuteOutOfRange(75))
        );
        assert_eq!(
            "13 PM".parse::<Time>(),
            Err(TimeParseError::HourOutOfRange {
                hour: 13,
                convention: "12-hour"
            })
        );
        assert_eq!(
            "0 AM".parse::<Time>(),
            Err(TimeParseError::HourOutOfRange {
                hour: 0,
                convention: "12-hour"
            })
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            "".parse::<Time>(),
            Err(TimeParseError::Unrecognized(_))
        ));
        assert!(matches!(
            "noon".parse::<Time>(),
            Err(TimeParseError::Unrecognized(_))
        ));
        assert!(matches!(
            "8:3".parse::<Time>(),
            Err(TimeParseError::Unrecognized(_))
        ));
    }

    #[test]
    fn window_contains_simple() {
        let window = TimeWindow::new(t(9, 0), t(17, 0));
        assert!(window.contains(t(9, 0)));
        assert!(window.contains(t(12, 30)));
        assert!(window.contains(t(17, 0)));
        assert!(!window.contains(t(8, 59)));
        assert!(!window.contains(t(17, 1)));
    }

    #[test]
    fn window_contains_wrapping() {
        let window = TimeWindow::new(t(20, 0), t(8, 0));
        assert!(window.contains(t(22, 59)));
        assert!(window.contains(t(20, 0)));
        assert!(window.contains(t(8, 0)));
        assert!(window.contains(t(2, 15)));
        assert!(!window.contains(t(12, 0)));
        assert!(!window.contains(t(8, 1)));
    }

    #[test]
    fn window_is_in_window_uses_clock_face() {
        let window = TimeWindow::new(t(20, 0), t(8, 0));
        let late = Utc.with_ymd_and_hms(2025, 3, 10, 22, 59, 30).unwrap();
        let noon = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert!(window.is_in_window(&late));
        assert!(!window.is_in_window(&noon));
    }

    #[test]
    fn window_duration() {
        assert_eq!(
            TimeWindow::new(t(9, 0), t(17, 0)).duration(),
            Duration::hours(8)
        );
        assert_eq!(
            TimeWindow::new(t(20, 0), t(8, 0)).duration(),
            Duration::hours(12)
        );
        assert_eq!(
            TimeWindow::new(Time::MIDNIGHT, t(8, 0)).duration(),
            Duration::hours(8)
        );
    }

    #[test]
    fn occurrence_of_wrapping_window_ends_next_day() {
        let window = TimeWindow::new(t(22, 0), t(6, 0));
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let occurrence = window.occurrence_on(date);
        assert_eq!(
            occurrence.start,
            Utc.with_ymd_and_hms(2025, 3, 10, 22, 0, 0).unwrap()
        );
        assert_eq!(
            occurrence.end,
            Utc.with_ymd_and_hms(2025, 3, 11, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn day_segments_cover_window() {
        let plain = TimeWindow::new(t(9, 0), t(17, 0));
        let [first, second] = plain.day_segments();
        assert_eq!(first, (t(9, 0), Duration::hours(8)));
        assert_eq!(second.1, Duration::zero());

        let wrapped = TimeWindow::new(t(22, 0), t(6, 0));
        let [head, tail] = wrapped.day_segments();
        assert_eq!(head, (t(22, 0), Duration::hours(2)));
        assert_eq!(tail, (Time::MIDNIGHT, Duration::hours(6)));
    }
}
