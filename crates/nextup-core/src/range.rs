//! Absolute instant ranges and their periodic recurrences.
//!
//! [`DateRange`] is an ordered pair of instants. It is deliberately not
//! normalized: a range whose start is after its end yields a negative
//! duration, and callers rely on the sign. [`RecurringDateRange`] repeats a
//! range at a fixed period and answers containment with modular arithmetic,
//! so it is exact for instants arbitrarily far in the past or future.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{Time, TimeWindow};
use crate::error::ValidationError;

/// An ordered pair of absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateRange { start, end }
    }

    /// Signed raw duration, `end - start`.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Signed duration with every daily occurrence of `window` subtracted.
    ///
    /// The subtraction is closed-form over the day count: the portion of the
    /// window overlapping the first day, the portion overlapping the last
    /// day, and one full window length per whole day in between. Wrapping
    /// windows are decomposed into their two within-day segments first.
    /// Reversed ranges compute on the reversed range and negate.
    pub fn duration_without_window(&self, window: &TimeWindow) -> Duration {
        if self.start > self.end {
            return -DateRange::new(self.end, self.start).duration_without_window(window);
        }
        let mut blocked = Duration::zero();
        for (seg_start, seg_len) in window.day_segments() {
            blocked = blocked + self.segment_overlap(seg_start, seg_len);
        }
        self.duration() - blocked
    }

    /// Total overlap between this range (start <= end) and the daily
    /// occurrences of one within-day window segment.
    fn segment_overlap(&self, seg_start: Time, seg_len: Duration) -> Duration {
        if seg_len <= Duration::zero() {
            return Duration::zero();
        }
        let first_day = self.start.date_naive();
        let last_day = self.end.date_naive();
        if first_day == last_day {
            return self.clip(seg_start, seg_len, first_day);
        }
        let whole_days = last_day.signed_duration_since(first_day).num_days() - 1;
        self.clip(seg_start, seg_len, first_day)
            + self.clip(seg_start, seg_len, last_day)
            + seg_len * (whole_days as i32)
    }

    /// Overlap between this range and the segment's occurrence on one day.
    fn clip(&self, seg_start: Time, seg_len: Duration, day: NaiveDate) -> Duration {
        let occ_start = seg_start.on_date(day);
        let occ_end = occ_start + seg_len;
        let start = self.start.max(occ_start);
        let end = self.end.min(occ_end);
        if end > start {
            end - start
        } else {
            Duration::zero()
        }
    }
}

/// A [`DateRange`] repeated at a fixed period.
///
/// The underlying range defines the phase and the span of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringDateRange {
    range: DateRange,
    period_ms: i64,
}

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

impl RecurringDateRange {
    /// Build a recurrence; the period must be strictly positive.
    pub fn new(range: DateRange, period: Duration) -> Result<Self, ValidationError> {
        let millis = period.num_milliseconds();
        if millis <= 0 {
            return Err(ValidationError::NonPositivePeriod { millis });
        }
        Ok(RecurringDateRange {
            range,
            period_ms: millis,
        })
    }

    /// The default weekly downtime: Saturday 00:00 through Sunday 23:59 of
    /// the week containing `now`, repeating every seven days.
    pub fn weekend_of(now: DateTime<Utc>) -> Self {
        use chrono::Datelike;
        let date = now.date_naive();
        // Saturday is 5 days from Monday.
        let days_since_saturday = (date.weekday().num_days_from_monday() + 2) % 7;
        let saturday = date - Duration::days(days_since_saturday as i64);
        let start = Time::MIDNIGHT.on_date(saturday);
        let end = Time::from_hm(23, 59).on_date(saturday + Duration::days(1));
        RecurringDateRange {
            range: DateRange::new(start, end),
            period_ms: WEEK_MS,
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn period(&self) -> Duration {
        Duration::milliseconds(self.period_ms)
    }

    /// Whether `at` falls inside any periodic occurrence of the range.
    ///
    /// Uses `k = floor((at - start) / period)` rather than iterating, so an
    /// instant any number of periods away resolves in constant time.
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let offset_ms = (*at - self.range.start).num_milliseconds();
        let k = offset_ms.div_euclid(self.period_ms);
        let into_occurrence = offset_ms - k * self.period_ms;
        into_occurrence <= self.range.duration().num_milliseconds()
    }
}
