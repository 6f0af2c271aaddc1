//! Date range validation for history queries.

use super::provider::DateRange;
use chrono::{Duration, NaiveDate};

/// How requested date ranges are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePolicy {
    /// Longest span served, in days.
    pub max_span_days: i64,
    /// Span served when the request cannot be parsed, ending today.
    pub fallback_days: i64,
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self {
            max_span_days: 730,
            fallback_days: 30,
        }
    }
}

impl RangePolicy {
    /// Resolve `YYYY-MM-DD` bounds into a servable range.
    ///
    /// Reversed bounds are swapped, the end never passes `today`, the span
    /// never exceeds `max_span_days`, and start never passes end. Unparseable
    /// input yields the trailing `fallback_days` ending today.
    pub fn resolve(&self, start: &str, end: &str, today: NaiveDate) -> DateRange {
        let parsed = (
            NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d"),
            NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d"),
        );
        let (mut start, mut end) = match parsed {
            (Ok(s), Ok(e)) => (s, e),
            _ => {
                return DateRange {
                    start: days_before(today, self.fallback_days),
                    end: today,
                }
            }
        };

        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        end = end.min(today);

        let earliest = days_before(end, self.max_span_days);
        start = start.max(earliest).min(end);

        DateRange { start, end }
    }
}

/// `date` minus `days`, saturating at the earliest representable date.
fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days.max(0))
        .and_then(|span| date.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}
