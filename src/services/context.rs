//! Context snapshot handed to the question generator.

use crate::analytics::scoring::{score_value, DriverTotals};
use crate::analytics::trend::{round1, DateRange};
use crate::db::SurveyStore;
use crate::domain::models::{AnswerRecord, AnswerSample, DriverKey};
use crate::domain::titles::normalize_title;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

pub const CONTEXT_WINDOW_DAYS: i64 = 7;
pub const MIN_DRIVER_SAMPLES: usize = 3;
pub const MAX_RECENT_QUESTIONS: usize = 12;
pub const MAX_ANSWER_SAMPLES: usize = 6;
const RECENT_RUNS: i64 = 7;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverStat {
    pub driver_key: DriverKey,
    pub avg: Option<f64>,
    pub delta: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub drivers: Vec<DriverStat>,
    pub missing_drivers: Vec<DriverKey>,
    pub recent_questions: Vec<String>,
    pub answer_samples: Vec<AnswerSample>,
}

fn totals_for(records: &[AnswerRecord], range: &DateRange) -> DriverTotals {
    let mut totals = DriverTotals::new();
    for record in records.iter().filter(|r| range.contains(r.answered_on)) {
        if let Some(score) = score_value(record.value, &record.question) {
            totals.add(score);
        }
    }
    totals
}

/// Pure part of BuildContext. `records` must be newest first.
pub fn build_context_snapshot(
    run_date: NaiveDate,
    records: &[AnswerRecord],
    recent_texts: &[String],
) -> ContextSnapshot {
    let current_range = DateRange::trailing(run_date, CONTEXT_WINDOW_DAYS);
    let previous_range = current_range.previous();
    let current = totals_for(records, &current_range);
    let previous = totals_for(records, &previous_range);

    let drivers: Vec<DriverStat> = DriverKey::ALL
        .iter()
        .map(|driver| {
            let now = current.get(*driver);
            let avg = now.and_then(|s| s.mean());
            let before = previous.get(*driver).and_then(|s| s.mean());
            DriverStat {
                driver_key: *driver,
                avg: avg.map(round1),
                delta: avg.zip(before).map(|(a, b)| round1(a - b)),
                count: now.map(|s| s.count).unwrap_or(0),
            }
        })
        .collect();

    let missing_drivers = drivers
        .iter()
        .filter(|d| d.count < MIN_DRIVER_SAMPLES)
        .map(|d| d.driver_key)
        .collect();

    let mut seen = HashSet::new();
    let recent_questions = recent_texts
        .iter()
        .filter(|t| seen.insert(normalize_title(t)))
        .take(MAX_RECENT_QUESTIONS)
        .cloned()
        .collect();

    let answer_samples = records
        .iter()
        .filter(|r| current_range.contains(r.answered_on))
        .filter_map(|r| {
            Some(AnswerSample {
                text: r.question.text.clone(),
                value: r.value.filter(|v| v.is_finite())?,
                driver_key: r.question.driver_key,
                polarity: r.question.polarity,
            })
        })
        .take(MAX_ANSWER_SAMPLES)
        .collect();

    ContextSnapshot {
        drivers,
        missing_drivers,
        recent_questions,
        answer_samples,
    }
}

/// BuildContext: both windows' answers plus the member's recent question texts.
pub async fn load_context(
    store: &dyn SurveyStore,
    member_id: Uuid,
    run_date: NaiveDate,
) -> Result<ContextSnapshot> {
    let window = DateRange::trailing(run_date, CONTEXT_WINDOW_DAYS).with_previous();
    let (records, recent_texts) = futures::try_join!(
        store.scored_answers_between(member_id, window.from, window.to),
        store.recent_question_texts(member_id, run_date, RECENT_RUNS),
    )?;

    let snapshot = build_context_snapshot(run_date, &records, &recent_texts);
    tracing::debug!(
        "Context for member {}: {} answers, {} recent questions, {} under-sampled drivers",
        member_id,
        records.len(),
        snapshot.recent_questions.len(),
        snapshot.missing_drivers.len()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Polarity, Question, QuestionType};

    fn record(driver: DriverKey, value: f64, day: u32) -> AnswerRecord {
        AnswerRecord {
            question: Question {
                id: Uuid::new_v4(),
                order: 1,
                text: format!("{} statement", driver.as_str()),
                qtype: QuestionType::Scale,
                scale_min: Some(0),
                scale_max: Some(10),
                driver_key: driver,
                polarity: Polarity::Negative,
                needs_review: false,
                choices: None,
                required: true,
            },
            value: Some(value),
            answered_on: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
        }
    }

    #[test]
    fn test_driver_stats_and_missing_drivers() {
        let run_date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let records = vec![
            record(DriverKey::Workload, 8.0, 13),
            record(DriverKey::Workload, 6.0, 12),
            record(DriverKey::Workload, 7.0, 10),
            record(DriverKey::Workload, 4.0, 5),
            record(DriverKey::Support, 2.0, 11),
        ];
        let snapshot = build_context_snapshot(run_date, &records, &[]);

        let workload = snapshot
            .drivers
            .iter()
            .find(|d| d.driver_key == DriverKey::Workload)
            .unwrap();
        assert_eq!(workload.count, 3);
        assert_eq!(workload.avg, Some(7.0));
        assert_eq!(workload.delta, Some(3.0));

        let support = snapshot
            .drivers
            .iter()
            .find(|d| d.driver_key == DriverKey::Support)
            .unwrap();
        assert_eq!(support.delta, None);

        assert!(!snapshot.missing_drivers.contains(&DriverKey::Workload));
        assert!(snapshot.missing_drivers.contains(&DriverKey::Support));
        assert_eq!(snapshot.missing_drivers.len(), DriverKey::ALL.len() - 1);
    }

    #[test]
    fn test_recent_questions_are_distinct_and_capped() {
        let run_date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let mut texts: Vec<String> = (0..20).map(|i| format!("Question {i}")).collect();
        texts.insert(1, "question  0".to_string());
        let snapshot = build_context_snapshot(run_date, &[], &texts);
        assert_eq!(snapshot.recent_questions.len(), MAX_RECENT_QUESTIONS);
        assert_eq!(snapshot.recent_questions[0], "Question 0");
        assert_eq!(snapshot.recent_questions[1], "Question 1");
    }

    #[test]
    fn test_answer_samples_come_from_current_window() {
        let run_date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let mut records: Vec<AnswerRecord> =
            (0..8).map(|_| record(DriverKey::Balance, 5.0, 13)).collect();
        records.push(record(DriverKey::Growth, 1.0, 2));
        let snapshot = build_context_snapshot(run_date, &records, &[]);
        assert_eq!(snapshot.answer_samples.len(), MAX_ANSWER_SAMPLES);
        assert!(snapshot
            .answer_samples
            .iter()
            .all(|s| s.driver_key == DriverKey::Balance));
    }
}
