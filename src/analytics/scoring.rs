//! Answer scoring and the overall stress index.
//!
//! Every score here lives on a 0-10 stress scale where 10 is the most stressed.
//! Non-scale questions and answers without a numeric value are excluded, never zeroed.

use crate::domain::models::{
    Answer, DriverKey, Polarity, Question, QuestionType, Response, RunAggregates, Template,
    DAILY_TARGET_COUNT,
};
use serde::Serialize;
use std::collections::BTreeMap;

pub const STRESS_MIN: f64 = 0.0;
pub const STRESS_MAX: f64 = 10.0;

const DEFAULT_SCALE: (i32, i32) = (0, 10);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverScore {
    pub driver_key: DriverKey,
    pub stress_score: f64,
}

/// Linear `[scale_min, scale_max] -> [0, 10]`, clamped, then flipped for POSITIVE polarity.
pub fn score_value(value: Option<f64>, question: &Question) -> Option<DriverScore> {
    if question.qtype != QuestionType::Scale {
        return None;
    }
    let raw = value.filter(|v| v.is_finite())?;
    let min = question.scale_min.unwrap_or(DEFAULT_SCALE.0) as f64;
    let max = question.scale_max.unwrap_or(DEFAULT_SCALE.1) as f64;
    if max <= min {
        return None;
    }

    let normalized = ((raw - min) / (max - min) * STRESS_MAX).clamp(STRESS_MIN, STRESS_MAX);
    let stress_score = match question.polarity {
        Polarity::Negative => normalized,
        Polarity::Positive => STRESS_MAX - normalized,
    };

    Some(DriverScore {
        driver_key: question.driver_key,
        stress_score,
    })
}

pub fn score_answer(answer: &Answer, question: &Question) -> Option<DriverScore> {
    score_value(answer.value, question)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverSum {
    pub sum: f64,
    pub count: usize,
}

impl DriverSum {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per-driver sums for one scoring pass. Answers tagged `unknown` are not grouped.
#[derive(Debug, Clone, Default)]
pub struct DriverTotals {
    totals: BTreeMap<DriverKey, DriverSum>,
}

impl DriverTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, score: DriverScore) {
        if !score.driver_key.is_known() {
            return;
        }
        let entry = self.totals.entry(score.driver_key).or_default();
        entry.sum += score.stress_score;
        entry.count += 1;
    }

    pub fn insert(&mut self, driver: DriverKey, sum: f64, count: usize) {
        self.totals.insert(driver, DriverSum { sum, count });
    }

    pub fn get(&self, driver: DriverKey) -> Option<&DriverSum> {
        self.totals.get(&driver)
    }

    pub fn means(&self) -> BTreeMap<DriverKey, f64> {
        self.totals
            .iter()
            .filter_map(|(driver, total)| total.mean().map(|m| (*driver, m)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.values().all(|t| t.count == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStress {
    pub avg: f64,
    pub answer_count: usize,
}

/// Unweighted mean of per-driver means, so a driver with more questions in a
/// template does not dominate the index.
pub fn compute_overall_stress_from_drivers(driver_totals: &DriverTotals) -> OverallStress {
    let means = driver_totals.means();
    let answer_count = driver_totals.totals.values().map(|t| t.count).sum();
    if means.is_empty() {
        return OverallStress {
            avg: 0.0,
            answer_count: 0,
        };
    }
    let avg = means.values().sum::<f64>() / means.len() as f64;
    OverallStress {
        avg: avg.clamp(STRESS_MIN, STRESS_MAX),
        answer_count,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseScore {
    pub stress_index: Option<f64>,
    pub engagement_score: Option<f64>,
    pub scored_answers: usize,
    pub driver_means: BTreeMap<DriverKey, f64>,
}

/// Scores a full answer set against its template.
///
/// The stress index is the driver macro-average; when no answer carried a known
/// driver it falls back to the plain mean of every scored answer. Engagement is the
/// same answers read in the wellbeing direction (`10 - stress`).
pub fn score_response(template: &Template, answers: &[Answer]) -> ResponseScore {
    let mut totals = DriverTotals::new();
    let mut raw_scores = Vec::new();

    for answer in answers {
        let Some(question) = template.question(answer.question_id) else {
            continue;
        };
        if let Some(score) = score_answer(answer, question) {
            totals.add(score);
            raw_scores.push(score.stress_score);
        }
    }

    let overall = compute_overall_stress_from_drivers(&totals);
    let stress_index = if overall.answer_count > 0 {
        Some(overall.avg)
    } else {
        mean(&raw_scores).map(|m| m.clamp(STRESS_MIN, STRESS_MAX))
    };
    let engagement_score = mean(
        &raw_scores
            .iter()
            .map(|s| STRESS_MAX - s)
            .collect::<Vec<_>>(),
    );

    ResponseScore {
        stress_index,
        engagement_score,
        scored_answers: raw_scores.len(),
        driver_means: totals.means(),
    }
}

/// Run aggregates are always recomputed from the full set of responses.
pub fn aggregate_run(responses: &[Response]) -> RunAggregates {
    let stress: Vec<f64> = responses.iter().filter_map(|r| r.stress_index).collect();
    let engagement: Vec<f64> = responses.iter().filter_map(|r| r.engagement_score).collect();
    RunAggregates {
        avg_stress_index: mean(&stress),
        avg_engagement_score: mean(&engagement),
        completed_count: responses.len() as i32,
        target_count: DAILY_TARGET_COUNT,
    }
}
