//! Group stage: buckets records by a time granularity.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashMap;

use crate::models::{GroupBy, GroupedBucket, ReportRecord};

/// Label of the bucket holding records without `date` or `created_at`.
pub const UNDATED_PERIOD: &str = "undated";

const DAY_LABEL_FORMAT: &str = "%a %b %d %Y";

/// Partitions records into period buckets ordered by period start.
///
/// Returns `None` for [`GroupBy::None`]. Undated records end up in a final
/// bucket labelled [`UNDATED_PERIOD`].
pub fn group_records(records: Vec<ReportRecord>, group_by: GroupBy) -> Option<Vec<GroupedBucket>> {
    if group_by == GroupBy::None {
        return None;
    }

    let mut buckets: Vec<GroupedBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut undated: Vec<ReportRecord> = Vec::new();

    for record in records {
        let Some(at) = record.timestamp() else {
            undated.push(record);
            continue;
        };
        let (period, start) = period_of(at.date_naive(), group_by);
        let slot = *index.entry(period.clone()).or_insert_with(|| {
            buckets.push(GroupedBucket {
                period,
                period_start: Some(start),
                count: 0,
                items: Vec::new(),
            });
            buckets.len() - 1
        });
        buckets[slot].items.push(record);
        buckets[slot].count += 1;
    }

    buckets.sort_by_key(|b| b.period_start);

    if !undated.is_empty() {
        buckets.push(GroupedBucket {
            period: UNDATED_PERIOD.to_string(),
            period_start: None,
            count: undated.len(),
            items: undated,
        });
    }

    Some(buckets)
}

/// Period label and first day of the period containing `date`.
pub fn period_of(date: NaiveDate, group_by: GroupBy) -> (String, NaiveDate) {
    match group_by {
        GroupBy::None | GroupBy::Day => (date.format(DAY_LABEL_FORMAT).to_string(), date),
        GroupBy::Week => {
            let start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
            (start.format(DAY_LABEL_FORMAT).to_string(), start)
        }
        GroupBy::Month => (
            format!("{}-{}", date.year(), date.month()),
            date.with_day(1).unwrap_or(date),
        ),
        GroupBy::Quarter => {
            let quarter = date.month0() / 3 + 1;
            let start = NaiveDate::from_ymd_opt(date.year(), (quarter - 1) * 3 + 1, 1).unwrap_or(date);
            (format!("{}-Q{}", date.year(), quarter), start)
        }
        GroupBy::Year => (
            date.year().to_string(),
            NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dated(y: i32, m: u32, d: u32) -> ReportRecord {
        ReportRecord {
            date: Some(Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_none_returns_none() {
        assert!(group_records(vec![dated(2024, 1, 15)], GroupBy::None).is_none());
    }

    #[test]
    fn test_quarter_scenario() {
        let buckets =
            group_records(vec![dated(2024, 1, 15), dated(2024, 2, 10)], GroupBy::Quarter).unwrap();

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].period, "2024-Q1");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].period_start, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_month_grouping_is_a_partition() {
        let records = vec![
            dated(2024, 3, 2),
            dated(2024, 1, 15),
            dated(2024, 3, 30),
            ReportRecord::default(),
            dated(2023, 12, 31),
            dated(2024, 1, 1),
        ];
        let buckets = group_records(records.clone(), GroupBy::Month).unwrap();

        let total: usize = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, records.len());

        let mut flattened: Vec<_> = buckets.into_iter().flat_map(|b| b.items).collect();
        let mut expected = records;
        let key = |r: &ReportRecord| r.timestamp();
        flattened.sort_by_key(key);
        expected.sort_by_key(key);
        assert_eq!(flattened, expected);
    }

    #[test]
    fn test_buckets_sorted_chronologically() {
        let records = vec![dated(2024, 3, 2), dated(2023, 12, 31), dated(2024, 1, 15)];
        let periods: Vec<_> = group_records(records, GroupBy::Month)
            .unwrap()
            .into_iter()
            .map(|b| b.period)
            .collect();
        assert_eq!(periods, vec!["2023-12", "2024-1", "2024-3"]);
    }

    #[test]
    fn test_undated_bucket_is_last() {
        let records = vec![ReportRecord::default(), dated(2024, 5, 1)];
        let buckets = group_records(records, GroupBy::Year).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period, "2024");
        assert_eq!(buckets[1].period, UNDATED_PERIOD);
        assert_eq!(buckets[1].period_start, None);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn test_created_at_fallback() {
        let record = ReportRecord {
            created_at: Some(Utc.with_ymd_and_hms(2024, 6, 9, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let buckets = group_records(vec![record], GroupBy::Day).unwrap();
        assert_eq!(buckets[0].period, "Sun Jun 09 2024");
    }

    #[test]
    fn test_period_labels() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();

        assert_eq!(period_of(date, GroupBy::Day).0, "Wed Jan 17 2024");
        assert_eq!(
            period_of(date, GroupBy::Week),
            (
                "Sun Jan 14 2024".to_string(),
                NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
            )
        );
        assert_eq!(period_of(date, GroupBy::Month).0, "2024-1");
        assert_eq!(period_of(date, GroupBy::Quarter).0, "2024-Q1");
        assert_eq!(period_of(date, GroupBy::Year).0, "2024");
    }

    #[test]
    fn test_week_starts_on_sunday_across_year_boundary() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let (label, start) = period_of(date, GroupBy::Week);
        assert_eq!(label, "Sun Dec 29 2024");
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 29).unwrap());
    }

    #[test]
    fn test_quarter_boundaries() {
        let q4 = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        assert_eq!(
            period_of(q4, GroupBy::Quarter),
            ("2024-Q4".to_string(), q4)
        );
        let q3 = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        assert_eq!(period_of(q3, GroupBy::Quarter).0, "2024-Q3");
    }
}
