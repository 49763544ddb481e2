use crate::analytics::scoring::{aggregate_run, score_response, ResponseScore};
use crate::db::SurveyStore;
use crate::domain::models::{Answer, NewResponse, QuestionType, Response, RunAggregates, Template};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("run not found")]
    RunNotFound,
    #[error("run belongs to another member")]
    WrongMember,
    #[error("question {0} is not part of this survey")]
    UnknownQuestion(Uuid),
    #[error("question {0} answered more than once")]
    DuplicateAnswer(Uuid),
    #[error("required question {0} was not answered")]
    MissingRequired(Uuid),
    #[error("invalid answer for question {0}")]
    InvalidAnswer(Uuid),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub response: Response,
    pub score: ResponseScore,
    pub avg_stress_index: Option<f64>,
    pub avg_engagement_score: Option<f64>,
    pub completed_count: i32,
    pub target_count: i32,
}

fn is_answered(answer: &Answer) -> bool {
    answer.value.is_some_and(|v| v.is_finite())
        || answer.text.as_deref().is_some_and(|t| !t.trim().is_empty())
        || answer.choices.as_ref().is_some_and(|c| !c.is_empty())
}

/// Every answer must belong to the template, appear once, and fit its question type;
/// required questions must be answered.
pub fn validate_answers(template: &Template, answers: &[Answer]) -> Result<(), SubmissionError> {
    let mut seen = HashSet::new();
    for answer in answers {
        let question = template
            .question(answer.question_id)
            .ok_or(SubmissionError::UnknownQuestion(answer.question_id))?;
        if !seen.insert(answer.question_id) {
            return Err(SubmissionError::DuplicateAnswer(answer.question_id));
        }

        let valid = match question.qtype {
            QuestionType::Scale => answer.value.map_or(true, |v| v.is_finite()),
            QuestionType::Text => true,
            QuestionType::SingleChoice | QuestionType::MultiChoice => {
                match (&answer.choices, &question.choices) {
                    (None, _) => true,
                    (Some(picked), Some(allowed)) => {
                        (question.qtype == QuestionType::MultiChoice || picked.len() <= 1)
                            && picked.iter().all(|p| allowed.contains(p))
                    }
                    (Some(picked), None) => picked.is_empty(),
                }
            }
        };
        if !valid {
            return Err(SubmissionError::InvalidAnswer(answer.question_id));
        }
    }

    for question in template.questions.iter().filter(|q| q.required) {
        let answered = answers
            .iter()
            .any(|a| a.question_id == question.id && is_answered(a));
        if !answered {
            return Err(SubmissionError::MissingRequired(question.id));
        }
    }
    Ok(())
}

/// Validates, scores and stores one response, then recomputes the run aggregates
/// from every response the run has.
pub async fn submit_response(
    store: &dyn SurveyStore,
    run_id: Uuid,
    member_id: Uuid,
    answers: Vec<Answer>,
    submitted_at: DateTime<Utc>,
) -> Result<SubmissionOutcome, SubmissionError> {
    let run = store
        .find_run(run_id)
        .await?
        .ok_or(SubmissionError::RunNotFound)?;
    if run.member_id != member_id {
        return Err(SubmissionError::WrongMember);
    }
    let template = store
        .load_template(run.template_id)
        .await?
        .ok_or(SubmissionError::RunNotFound)?;

    validate_answers(&template, &answers)?;
    let score = score_response(&template, &answers);

    let response = store
        .insert_response(NewResponse {
            run_id,
            member_id,
            submitted_at,
            stress_index: score.stress_index,
            engagement_score: score.engagement_score,
            answers,
        })
        .await?;

    let responses = store.responses_for_run(run_id).await?;
    let aggregates: RunAggregates = aggregate_run(&responses);
    store.update_run_aggregates(run_id, aggregates).await?;

    tracing::info!(
        "Response {} stored for run {} ({} scored answers, {} responses total)",
        response.id,
        run_id,
        score.scored_answers,
        aggregates.completed_count
    );

    Ok(SubmissionOutcome {
        response,
        score,
        avg_stress_index: aggregates.avg_stress_index,
        avg_engagement_score: aggregates.avg_engagement_score,
        completed_count: aggregates.completed_count,
        target_count: aggregates.target_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Language, NewRun, TemplateSource, DAILY_TARGET_COUNT};
    use crate::domain::seed_bank;
    use crate::testing::MemoryStore;
    use chrono::NaiveDate;

    async fn setup() -> (MemoryStore, Template, Uuid, Uuid) {
        let store = MemoryStore::new();
        let template = store
            .create_template(seed_bank::seed_day_template(1, Language::En).unwrap())
            .await
            .unwrap();
        let member = Uuid::new_v4();
        let run = store
            .insert_daily_run(NewRun {
                member_id: member,
                template_id: template.id,
                run_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                source: TemplateSource::Seed,
                day_index: 1,
                target_count: DAILY_TARGET_COUNT,
            })
            .await
            .unwrap()
            .into_run();
        (store, template, member, run.id)
    }

    fn full_answers(template: &Template, value: f64) -> Vec<Answer> {
        template
            .questions
            .iter()
            .filter(|q| q.qtype == QuestionType::Scale)
            .map(|q| Answer {
                question_id: q.id,
                value: Some(value.clamp(q.scale_min.unwrap_or(0) as f64, q.scale_max.unwrap_or(10) as f64)),
                text: None,
                choices: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_submission_scores_and_updates_run() {
        let (store, template, member, run_id) = setup().await;
        let outcome = submit_response(&store, run_id, member, full_answers(&template, 3.0), Utc::now())
            .await
            .unwrap();

        assert!(outcome.score.stress_index.is_some());
        assert_eq!(outcome.completed_count, 1);
        assert_eq!(outcome.target_count, 1);
        assert_eq!(outcome.avg_stress_index, outcome.score.stress_index);

        let run = store.find_run(run_id).await.unwrap().unwrap();
        assert_eq!(run.completed_count, 1);
        assert_eq!(run.avg_engagement_score, outcome.score.engagement_score);
    }

    #[tokio::test]
    async fn test_aggregates_average_all_responses() {
        let (store, template, member, run_id) = setup().await;
        let first = submit_response(&store, run_id, member, full_answers(&template, 1.0), Utc::now())
            .await
            .unwrap();
        let second = submit_response(&store, run_id, member, full_answers(&template, 5.0), Utc::now())
            .await
            .unwrap();

        let expected = (first.score.stress_index.unwrap() + second.score.stress_index.unwrap()) / 2.0;
        assert_eq!(second.completed_count, 2);
        assert!((second.avg_stress_index.unwrap() - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rejects_foreign_and_missing_answers() {
        let (store, template, member, run_id) = setup().await;

        let foreign = vec![Answer {
            question_id: Uuid::new_v4(),
            value: Some(3.0),
            text: None,
            choices: None,
        }];
        assert!(matches!(
            submit_response(&store, run_id, member, foreign, Utc::now()).await,
            Err(SubmissionError::UnknownQuestion(_))
        ));

        let mut partial = full_answers(&template, 3.0);
        partial.pop();
        assert!(matches!(
            submit_response(&store, run_id, member, partial, Utc::now()).await,
            Err(SubmissionError::MissingRequired(_))
        ));

        assert!(matches!(
            submit_response(&store, run_id, Uuid::new_v4(), full_answers(&template, 3.0), Utc::now()).await,
            Err(SubmissionError::WrongMember)
        ));
        assert!(matches!(
            submit_response(&store, Uuid::new_v4(), member, Vec::new(), Utc::now()).await,
            Err(SubmissionError::RunNotFound)
        ));
        assert_eq!(store.count_responses(run_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_answers_are_rejected() {
        let (_, template, _, _) = setup().await;
        let mut answers = full_answers(&template, 2.0);
        answers.push(answers[0].clone());
        assert!(matches!(
            validate_answers(&template, &answers),
            Err(SubmissionError::DuplicateAnswer(_))
        ));
    }
}
