//! Time-bucketed trend series for stress, engagement and the blended overall metric.
//!
//! Granularity follows the inclusive span of the requested range. Bucket boundaries
//! cover the whole range, but buckets without samples are left out of the series so
//! "no data" never reads as a zero.

use crate::analytics::scoring::STRESS_MAX;
use crate::domain::models::Language;
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const DAY_GRANULARITY_MAX_DAYS: i64 = 31;
pub const WEEK_GRANULARITY_MAX_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TrendScope {
    Member(Uuid),
    Organization(Uuid),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (to >= from).then_some(Self { from, to })
    }

    /// The `days`-long window ending on (and including) `end`.
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        Self {
            from: end - Duration::days(days.max(1) - 1),
            to: end,
        }
    }

    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Immediately preceding, non-overlapping window of identical length.
    pub fn previous(&self) -> Self {
        let to = self.from - Duration::days(1);
        Self {
            from: to - Duration::days(self.span_days() - 1),
            to,
        }
    }

    /// Smallest range covering both this window and its predecessor.
    pub fn with_previous(&self) -> Self {
        Self {
            from: self.previous().from,
            to: self.to,
        }
    }
}

pub fn select_granularity(range: &DateRange) -> Granularity {
    let span = range.span_days();
    if span <= DAY_GRANULARITY_MAX_DAYS {
        Granularity::Day
    } else if span <= WEEK_GRANULARITY_MAX_DAYS {
        Granularity::Week
    } else {
        Granularity::Month
    }
}

/// Day itself, ISO week Monday, or the first of the month.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> String {
    let start = bucket_start(date, granularity);
    match granularity {
        Granularity::Day | Granularity::Week => start.format("%Y-%m-%d").to_string(),
        Granularity::Month => start.format("%Y-%m").to_string(),
    }
}

fn next_bucket(start: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => start + Duration::days(1),
        Granularity::Week => start + Duration::days(7),
        Granularity::Month => {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start + Duration::days(31))
        }
    }
}

/// Every bucket start touching the range, including empty ones.
pub fn bucket_starts(range: &DateRange, granularity: Granularity) -> Vec<NaiveDate> {
    let mut starts = Vec::new();
    let mut cursor = bucket_start(range.from, granularity);
    while cursor <= range.to {
        starts.push(cursor);
        cursor = next_bucket(cursor, granularity);
    }
    starts
}

fn chrono_locale(language: Language) -> chrono::Locale {
    match language {
        Language::En => chrono::Locale::en_US,
        Language::Uk => chrono::Locale::uk_UA,
    }
}

pub fn bucket_label(start: NaiveDate, granularity: Granularity, language: Language) -> String {
    let format = match granularity {
        Granularity::Day | Granularity::Week => "%b %-d",
        Granularity::Month => "%b",
    };
    start
        .and_hms_opt(0, 0, 0)
        .map(|midnight| {
            Utc.from_utc_datetime(&midnight)
                .format_localized(format, chrono_locale(language))
                .to_string()
        })
        .unwrap_or_else(|| start.to_string())
}

/// One dated observation, usually a scored response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendSample {
    pub date: NaiveDate,
    pub stress: Option<f64>,
    pub engagement: Option<f64>,
}

impl TrendSample {
    /// Wellbeing-direction display metric from whichever readings exist.
    pub fn overall(&self) -> Option<f64> {
        let calm = self.stress.map(|s| STRESS_MAX - s);
        match (calm, self.engagement) {
            (Some(c), Some(e)) => Some((c + e) / 2.0),
            (Some(c), None) => Some(c),
            (None, Some(e)) => Some(e),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Stress,
    Engagement,
    Overall,
}

impl Metric {
    pub fn select(&self, sample: &TrendSample) -> Option<f64> {
        match self {
            Metric::Stress => sample.stress,
            Metric::Engagement => sample.engagement,
            Metric::Overall => sample.overall(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketAggregate {
    pub sum: f64,
    pub count: usize,
}

impl BucketAggregate {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub key: String,
    pub label: String,
    pub value: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendSeries {
    pub granularity: Granularity,
    pub bucket_count: usize,
    pub stress: Vec<TrendPoint>,
    pub engagement: Vec<TrendPoint>,
    pub overall: Vec<TrendPoint>,
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn emit(
    starts: &[NaiveDate],
    buckets: &BTreeMap<NaiveDate, BucketAggregate>,
    granularity: Granularity,
    language: Language,
) -> Vec<TrendPoint> {
    starts
        .iter()
        .filter_map(|start| {
            let bucket = buckets.get(start).filter(|b| b.count > 0)?;
            Some(TrendPoint {
                key: bucket_key(*start, granularity),
                label: bucket_label(*start, granularity, language),
                value: round1(bucket.sum / bucket.count as f64),
                count: bucket.count,
            })
        })
        .collect()
}

/// Single-metric series over `range`.
pub fn build_trend(
    range: &DateRange,
    samples: &[TrendSample],
    metric: Metric,
    language: Language,
) -> Vec<TrendPoint> {
    let granularity = select_granularity(range);
    let starts = bucket_starts(range, granularity);
    let mut buckets: BTreeMap<NaiveDate, BucketAggregate> = BTreeMap::new();

    for sample in samples.iter().filter(|s| range.contains(s.date)) {
        if let Some(value) = metric.select(sample).filter(|v| v.is_finite()) {
            buckets
                .entry(bucket_start(sample.date, granularity))
                .or_default()
                .push(value);
        }
    }

    emit(&starts, &buckets, granularity, language)
}

/// All three series in one pass, each metric accumulated independently.
pub fn build_trend_series(
    range: &DateRange,
    samples: &[TrendSample],
    language: Language,
) -> TrendSeries {
    let granularity = select_granularity(range);
    let starts = bucket_starts(range, granularity);
    let mut stress: BTreeMap<NaiveDate, BucketAggregate> = BTreeMap::new();
    let mut engagement: BTreeMap<NaiveDate, BucketAggregate> = BTreeMap::new();
    let mut overall: BTreeMap<NaiveDate, BucketAggregate> = BTreeMap::new();

    for sample in samples.iter().filter(|s| range.contains(s.date)) {
        let start = bucket_start(sample.date, granularity);
        for (metric, buckets) in [
            (Metric::Stress, &mut stress),
            (Metric::Engagement, &mut engagement),
            (Metric::Overall, &mut overall),
        ] {
            if let Some(value) = metric.select(sample).filter(|v| v.is_finite()) {
                buckets.entry(start).or_default().push(value);
            }
        }
    }

    TrendSeries {
        granularity,
        bucket_count: starts.len(),
        stress: emit(&starts, &stress, granularity, language),
        engagement: emit(&starts, &engagement, granularity, language),
        overall: emit(&starts, &overall, granularity, language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(from: NaiveDate, to: NaiveDate) -> DateRange {
        DateRange::new(from, to).unwrap()
    }

    fn sample(d: NaiveDate, stress: Option<f64>, engagement: Option<f64>) -> TrendSample {
        TrendSample {
            date: d,
            stress,
            engagement,
        }
    }

    #[test]
    fn test_granularity_by_span() {
        let start = date(2024, 1, 1);
        let days = |n: i64| range(start, start + Duration::days(n - 1));
        assert_eq!(select_granularity(&days(10)), Granularity::Day);
        assert_eq!(select_granularity(&days(31)), Granularity::Day);
        assert_eq!(select_granularity(&days(32)), Granularity::Week);
        assert_eq!(select_granularity(&days(60)), Granularity::Week);
        assert_eq!(select_granularity(&days(180)), Granularity::Week);
        assert_eq!(select_granularity(&days(181)), Granularity::Month);
        assert_eq!(select_granularity(&days(400)), Granularity::Month);
    }

    #[test]
    fn test_ten_day_range_has_ten_day_buckets() {
        let r = range(date(2024, 1, 1), date(2024, 1, 10));
        assert_eq!(select_granularity(&r), Granularity::Day);
        let starts = bucket_starts(&r, Granularity::Day);
        assert_eq!(starts.len(), 10);
        assert_eq!(starts[0], date(2024, 1, 1));
        assert_eq!(starts[9], date(2024, 1, 10));
    }

    #[test]
    fn test_weeks_start_on_monday() {
        // 2024-01-10 is a Wednesday
        assert_eq!(bucket_start(date(2024, 1, 10), Granularity::Week), date(2024, 1, 8));
        assert_eq!(bucket_key(date(2024, 1, 14), Granularity::Week), "2024-01-08");
        assert_eq!(bucket_key(date(2024, 1, 15), Granularity::Week), "2024-01-15");

        let r = range(date(2024, 1, 3), date(2024, 2, 20));
        let starts = bucket_starts(&r, Granularity::Week);
        assert_eq!(starts.first(), Some(&date(2024, 1, 1)));
        assert!(starts.iter().all(|d| d.weekday() == chrono::Weekday::Mon));
        assert_eq!(starts.last(), Some(&date(2024, 2, 19)));
    }

    #[test]
    fn test_month_buckets_cross_year_boundary() {
        let r = range(date(2023, 11, 15), date(2024, 12, 31));
        let starts = bucket_starts(&r, Granularity::Month);
        assert_eq!(starts.len(), 14);
        assert_eq!(starts[0], date(2023, 11, 1));
        assert_eq!(starts[2], date(2024, 1, 1));
        assert_eq!(bucket_key(date(2024, 2, 29), Granularity::Month), "2024-02");
    }

    #[test]
    fn test_empty_buckets_are_omitted_not_zeroed() {
        let r = range(date(2024, 1, 1), date(2024, 1, 10));
        let samples = vec![
            sample(date(2024, 1, 2), Some(4.0), None),
            sample(date(2024, 1, 2), Some(5.0), None),
            sample(date(2024, 1, 9), Some(7.0), None),
        ];
        let points = build_trend(&r, &samples, Metric::Stress, Language::En);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].key, "2024-01-02");
        assert_eq!(points[0].value, 4.5);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[1].key, "2024-01-09");
    }

    #[test]
    fn test_samples_outside_range_are_ignored() {
        let r = range(date(2024, 1, 1), date(2024, 1, 10));
        let samples = vec![
            sample(date(2023, 12, 31), Some(9.0), None),
            sample(date(2024, 1, 11), Some(9.0), None),
            sample(date(2024, 1, 5), Some(3.0), None),
        ];
        let points = build_trend(&r, &samples, Metric::Stress, Language::En);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 3.0);
    }

    #[test]
    fn test_values_are_rounded_to_one_decimal() {
        let r = range(date(2024, 1, 1), date(2024, 1, 3));
        let samples = vec![
            sample(date(2024, 1, 1), Some(1.0), None),
            sample(date(2024, 1, 1), Some(2.0), None),
            sample(date(2024, 1, 1), Some(2.0), None),
        ];
        let points = build_trend(&r, &samples, Metric::Stress, Language::En);
        assert_eq!(points[0].value, 1.7);
    }

    #[test]
    fn test_metrics_accumulate_independently() {
        let r = range(date(2024, 3, 1), date(2024, 3, 7));
        let samples = vec![
            sample(date(2024, 3, 1), Some(6.0), Some(5.0)),
            sample(date(2024, 3, 1), None, Some(7.0)),
            sample(date(2024, 3, 2), Some(2.0), None),
        ];
        let series = build_trend_series(&r, &samples, Language::En);
        assert_eq!(series.granularity, Granularity::Day);
        assert_eq!(series.bucket_count, 7);
        assert_eq!(series.stress.len(), 2);
        assert_eq!(series.stress[0].value, 6.0);
        assert_eq!(series.engagement.len(), 1);
        assert_eq!(series.engagement[0].value, 6.0);
        // (4.5 + 7.0) / 2 on day one, 8.0 on day two
        assert_eq!(series.overall[0].value, 5.8);
        assert_eq!(series.overall[1].value, 8.0);
    }

    #[test]
    fn test_overall_blend_uses_whatever_is_available() {
        let d = date(2024, 1, 1);
        assert_eq!(sample(d, Some(2.0), Some(6.0)).overall(), Some(7.0));
        assert_eq!(sample(d, Some(2.0), None).overall(), Some(8.0));
        assert_eq!(sample(d, None, Some(6.0)).overall(), Some(6.0));
        assert_eq!(sample(d, None, None).overall(), None);
    }

    #[test]
    fn test_previous_window_is_adjacent_and_equal_length() {
        let r = range(date(2024, 3, 1), date(2024, 3, 14));
        let prev = r.previous();
        assert_eq!(prev.to, date(2024, 2, 29));
        assert_eq!(prev.from, date(2024, 2, 16));
        assert_eq!(prev.span_days(), r.span_days());
        assert!(!prev.contains(r.from));
        assert_eq!(r.with_previous().from, prev.from);
    }

    #[test]
    fn test_trailing_window() {
        let r = DateRange::trailing(date(2024, 5, 10), 7);
        assert_eq!(r.from, date(2024, 5, 4));
        assert_eq!(r.span_days(), 7);
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_labels_are_localized() {
        assert_eq!(bucket_label(date(2024, 1, 5), Granularity::Day, Language::En), "Jan 5");
        assert_eq!(bucket_label(date(2024, 3, 1), Granularity::Month, Language::En), "Mar");
        let uk = bucket_label(date(2024, 1, 5), Granularity::Day, Language::Uk);
        assert!(!uk.is_empty());
        assert_ne!(uk, "Jan 5");
    }
}
