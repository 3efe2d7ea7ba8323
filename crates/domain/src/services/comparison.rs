//! Period-over-period comparison.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::models::{DateRange, MetricComparison, PreviousPeriod, ReportSummary, Trend};

/// Percentage change below which a metric is considered stable.
pub const STABLE_THRESHOLD_PCT: f64 = 5.0;

/// Derives the comparison window for `current`.
///
/// Bounds that would fall outside chrono's representable range saturate at
/// [`DateTime::<Utc>::MIN_UTC`].
pub fn previous_range(current: &DateRange, period: PreviousPeriod) -> DateRange {
    let from = current.from;
    match period {
        PreviousPeriod::Previous => {
            let length = current.to - current.from;
            let to = saturating_sub(from, Duration::milliseconds(1));
            DateRange::new(saturating_sub(to, length), to)
        }
        PreviousPeriod::LastMonth => {
            let (year, month) = shift_month(from.year(), from.month(), -1);
            calendar_span(year, month, 1)
        }
        PreviousPeriod::LastQuarter => {
            let quarter_start = from.month0() / 3 * 3 + 1;
            let (year, month) = shift_month(from.year(), quarter_start, -3);
            calendar_span(year, month, 3)
        }
        PreviousPeriod::LastYear => calendar_span(from.year() - 1, 1, 12),
    }
}

/// Compares every key metric of `current` against `previous`.
pub fn compare_summaries(
    current: &ReportSummary,
    previous: &ReportSummary,
) -> BTreeMap<String, MetricComparison> {
    current
        .key_metrics
        .iter()
        .map(|(key, &now)| {
            let before = previous.key_metrics.get(key).copied().unwrap_or(0.0);
            (key.clone(), compare_metric(now, before))
        })
        .collect()
}

pub fn compare_metric(current: f64, previous: f64) -> MetricComparison {
    let change = current - previous;
    let percentage_change = if previous == 0.0 {
        0.0
    } else {
        change / previous * 100.0
    };
    let trend = if percentage_change.abs() < STABLE_THRESHOLD_PCT {
        Trend::Stable
    } else if percentage_change > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    };

    MetricComparison {
        current,
        previous,
        change,
        percentage_change,
        trend,
    }
}

/// `months` whole calendar months starting at `year-month-01`.
fn calendar_span(year: i32, month: u32, months: i32) -> DateRange {
    let (end_year, end_month) = shift_month(year, month, months);
    let start = midnight(year, month);
    let next = midnight(end_year, end_month);
    DateRange::new(start, saturating_sub(next, Duration::milliseconds(1)))
}

fn saturating_sub(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn midnight(year: i32, month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
