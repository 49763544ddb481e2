use crate::analytics::trend::{round1, DateRange, Metric, TrendSample};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub from: chrono::NaiveDate,
    pub to: chrono::NaiveDate,
    pub days: i64,
    pub samples: usize,
    pub stress: Option<f64>,
    pub engagement: Option<f64>,
    pub overall: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowDeltas {
    pub stress: Option<f64>,
    pub engagement: Option<f64>,
    pub overall: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowComparison {
    pub current: WindowSnapshot,
    pub previous: Option<WindowSnapshot>,
    pub deltas: Option<WindowDeltas>,
}

fn mean_of(samples: &[&TrendSample], metric: Metric) -> Option<f64> {
    let values: Vec<f64> = samples
        .iter()
        .filter_map(|s| metric.select(s))
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(round1(values.iter().sum::<f64>() / values.len() as f64))
}

/// Averages for one window, or `None` when it holds no samples at all.
pub fn snapshot_for(range: &DateRange, samples: &[TrendSample]) -> Option<WindowSnapshot> {
    let in_range: Vec<&TrendSample> = samples.iter().filter(|s| range.contains(s.date)).collect();
    if in_range.is_empty() {
        return None;
    }
    Some(WindowSnapshot {
        from: range.from,
        to: range.to,
        days: range.span_days(),
        samples: in_range.len(),
        stress: mean_of(&in_range, Metric::Stress),
        engagement: mean_of(&in_range, Metric::Engagement),
        overall: mean_of(&in_range, Metric::Overall),
    })
}

fn delta(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    Some(round1(current? - previous?))
}

/// Compares `range` against the equal-length window right before it.
pub fn compare_windows(range: &DateRange, samples: &[TrendSample]) -> Option<WindowComparison> {
    let current = snapshot_for(range, samples)?;
    let previous = snapshot_for(&range.previous(), samples);

    let deltas = previous.as_ref().map(|prev| WindowDeltas {
        stress: delta(current.stress, prev.stress),
        engagement: delta(current.engagement, prev.engagement),
        overall: delta(current.overall, prev.overall),
    });

    Some(WindowComparison {
        current,
        previous,
        deltas,
    })
}
