use crate::analytics::benchmark::{compare_windows, WindowComparison};
use crate::analytics::cache::{TrendCache, TrendCacheKey};
use crate::analytics::trend::{build_trend_series, DateRange, Granularity, TrendPoint, TrendScope};
use crate::db::SurveyStore;
use crate::domain::models::Language;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub scope: TrendScope,
    pub range: DateRange,
    pub granularity: Granularity,
    pub locale: Language,
    /// Blended overall metric.
    pub points: Vec<TrendPoint>,
    pub stress: Vec<TrendPoint>,
    pub engagement: Vec<TrendPoint>,
    pub comparison: Option<WindowComparison>,
}

/// getTrend: series over `range` plus the comparison against the preceding window.
/// Cached per (scope, range, locale, newest response).
pub async fn get_trend(
    store: &dyn SurveyStore,
    cache: &TrendCache<TrendReport>,
    scope: TrendScope,
    range: DateRange,
    language: Language,
) -> Result<TrendReport> {
    let latest_response_at = store.latest_response_at(scope).await?;
    let key = TrendCacheKey {
        scope,
        from: range.from,
        to: range.to,
        locale: language.as_str().to_string(),
        latest_response_at,
    };
    if let Some(hit) = cache.get(&key).await {
        tracing::debug!("Trend cache hit for {:?}", scope);
        return Ok(hit);
    }

    let samples = store.trend_samples(scope, range.with_previous()).await?;
    let series = build_trend_series(&range, &samples, language);
    let report = TrendReport {
        scope,
        range,
        granularity: series.granularity,
        locale: language,
        points: series.overall,
        stress: series.stress,
        engagement: series.engagement,
        comparison: compare_windows(&range, &samples),
    };

    cache.insert(key, report.clone()).await;
    Ok(report)
}
