//! Persistence boundary.
//!
//! Services talk to `SurveyStore`; `PgStore` is the Postgres implementation. Every
//! query is runtime-checked `sqlx::query`/`query_as` with bound parameters.

use crate::analytics::trend::{DateRange, TrendScope, TrendSample};
use crate::domain::models::{
    Answer, AnswerRecord, DriverKey, Language, NewGenerationLog, NewResponse, NewRun,
    NewTemplate, Polarity, Question, QuestionType, Response, Run, RunAggregates, RunInsert,
    Template, TemplateSource,
};
use crate::domain::titles::title_hash;
use crate::services::org::{MemberSettings, OrgDirectory};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn find_daily_run(&self, member_id: Uuid, run_date: NaiveDate) -> Result<Option<Run>>;
    /// Insert-or-fetch on `(member_id, run_date)`; a lost race yields `RunInsert::Existing`.
    async fn insert_daily_run(&self, run: NewRun) -> Result<RunInsert>;
    async fn count_daily_runs_before(&self, member_id: Uuid, run_date: NaiveDate) -> Result<i64>;
    async fn find_run(&self, run_id: Uuid) -> Result<Option<Run>>;

    async fn load_template(&self, template_id: Uuid) -> Result<Option<Template>>;
    async fn create_template(&self, template: NewTemplate) -> Result<Template>;
    async fn find_shared_seed_template(
        &self,
        day_index: i32,
        language: Language,
    ) -> Result<Option<Template>>;
    /// Points the run at another template only while it has no responses.
    async fn swap_run_template_if_unanswered(
        &self,
        run_id: Uuid,
        template_id: Uuid,
        source: TemplateSource,
    ) -> Result<Option<Run>>;
    async fn count_responses(&self, run_id: Uuid) -> Result<i64>;

    async fn append_generation_log(&self, log: NewGenerationLog) -> Result<()>;
    /// Whether a model-backed generation for this run (or for its creation, logged
    /// before the run existed) already failed in `language`.
    async fn generation_failed(
        &self,
        member_id: Uuid,
        run_id: Uuid,
        day_index: i32,
        language: Language,
    ) -> Result<bool>;

    /// Normalized-title hashes of every question ever served to the member.
    async fn member_title_hashes(&self, member_id: Uuid) -> Result<HashSet<String>>;
    /// Question texts of the member's last `run_limit` daily runs before `before`, newest first.
    async fn recent_question_texts(
        &self,
        member_id: Uuid,
        before: NaiveDate,
        run_limit: i64,
    ) -> Result<Vec<String>>;
    /// Answered scale questions with their metadata, newest first.
    async fn scored_answers_between(
        &self,
        member_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AnswerRecord>>;

    async fn insert_response(&self, response: NewResponse) -> Result<Response>;
    async fn responses_for_run(&self, run_id: Uuid) -> Result<Vec<Response>>;
    async fn update_run_aggregates(&self, run_id: Uuid, aggregates: RunAggregates) -> Result<()>;

    async fn trend_samples(&self, scope: TrendScope, range: DateRange) -> Result<Vec<TrendSample>>;
    async fn latest_response_at(&self, scope: TrendScope) -> Result<Option<DateTime<Utc>>>;
}

#[derive(Debug, FromRow)]
struct DbRun {
    id: Uuid,
    member_id: Uuid,
    template_id: Uuid,
    run_date: NaiveDate,
    source: String,
    day_index: i32,
    avg_stress_index: Option<f64>,
    avg_engagement_score: Option<f64>,
    completed_count: i32,
    target_count: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbTemplate {
    id: Uuid,
    language: String,
    source: String,
    day_index: i32,
    created_for_member_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DbQuestion {
    id: Uuid,
    position: i32,
    question_text: String,
    question_type: String,
    scale_min: Option<i32>,
    scale_max: Option<i32>,
    driver_key: String,
    polarity: String,
    needs_review: bool,
    choices: Option<Json<Vec<String>>>,
    required: bool,
}

#[derive(Debug, FromRow)]
struct DbAnswerRecord {
    #[sqlx(flatten)]
    question: DbQuestion,
    value: Option<f64>,
    answered_on: NaiveDate,
}

#[derive(Debug, FromRow)]
struct DbResponse {
    id: Uuid,
    run_id: Uuid,
    member_id: Uuid,
    submitted_at: DateTime<Utc>,
    stress_index: Option<f64>,
    engagement_score: Option<f64>,
}

#[derive(Debug, FromRow)]
struct DbAnswer {
    response_id: Uuid,
    question_id: Uuid,
    value: Option<f64>,
    answer_text: Option<String>,
    choices: Option<Json<Vec<String>>>,
}

#[derive(Debug, FromRow)]
struct DbTrendSample {
    run_date: NaiveDate,
    stress_index: Option<f64>,
    engagement_score: Option<f64>,
}

fn parse_source(raw: &str) -> Result<TemplateSource> {
    TemplateSource::try_from(raw).map_err(|_| anyhow!("unknown template source '{raw}'"))
}

impl TryFrom<DbRun> for Run {
    type Error = anyhow::Error;

    fn try_from(row: DbRun) -> Result<Self> {
        Ok(Run {
            id: row.id,
            member_id: row.member_id,
            template_id: row.template_id,
            run_date: row.run_date,
            source: parse_source(&row.source)?,
            day_index: row.day_index,
            avg_stress_index: row.avg_stress_index,
            avg_engagement_score: row.avg_engagement_score,
            completed_count: row.completed_count,
            target_count: row.target_count,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbQuestion> for Question {
    type Error = anyhow::Error;

    fn try_from(row: DbQuestion) -> Result<Self> {
        let qtype = QuestionType::try_from(row.question_type.as_str())
            .map_err(|_| anyhow!("unknown question type '{}'", row.question_type))?;
        let polarity = Polarity::try_from(row.polarity.as_str()).unwrap_or(Polarity::Negative);
        Ok(Question {
            id: row.id,
            order: row.position,
            text: row.question_text,
            qtype,
            scale_min: row.scale_min,
            scale_max: row.scale_max,
            driver_key: DriverKey::parse_loose(&row.driver_key),
            polarity,
            needs_review: row.needs_review,
            choices: row.choices.map(|c| c.0),
            required: row.required,
        })
    }
}

const RUN_COLUMNS: &str = "id, member_id, template_id, run_date, source, day_index, \
     avg_stress_index, avg_engagement_score, completed_count, target_count, created_at";

const QUESTION_COLUMNS: &str = "q.id, q.position, q.question_text, q.question_type, \
     q.scale_min, q.scale_max, q.driver_key, q.polarity, q.needs_review, q.choices, q.required";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_run(&self, run_id: Uuid) -> Result<Option<Run>> {
        let row = sqlx::query_as::<_, DbRun>(&format!(
            "SELECT {RUN_COLUMNS} FROM survey_runs WHERE id = $1"
        ))
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Run::try_from).transpose()
    }
}

#[async_trait]
impl SurveyStore for PgStore {
    async fn find_daily_run(&self, member_id: Uuid, run_date: NaiveDate) -> Result<Option<Run>> {
        let row = sqlx::query_as::<_, DbRun>(&format!(
            "SELECT {RUN_COLUMNS} FROM survey_runs WHERE member_id = $1 AND run_date = $2"
        ))
        .bind(member_id)
        .bind(run_date)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Run::try_from).transpose()
    }

    async fn insert_daily_run(&self, run: NewRun) -> Result<RunInsert> {
        let inserted = sqlx::query_as::<_, DbRun>(&format!(
            r#"
            INSERT INTO survey_runs
                (id, member_id, template_id, run_date, source, day_index, completed_count, target_count)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
            ON CONFLICT (member_id, run_date) DO NOTHING
            RETURNING {RUN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(run.member_id)
        .bind(run.template_id)
        .bind(run.run_date)
        .bind(run.source.as_str())
        .bind(run.day_index)
        .bind(run.target_count)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(RunInsert::Created(Run::try_from(row)?));
        }

        let existing = self
            .find_daily_run(run.member_id, run.run_date)
            .await?
            .ok_or_else(|| anyhow!("daily run conflict for member {} but no row found", run.member_id))?;
        Ok(RunInsert::Existing(existing))
    }

    async fn count_daily_runs_before(&self, member_id: Uuid, run_date: NaiveDate) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM survey_runs WHERE member_id = $1 AND run_date < $2",
        )
        .bind(member_id)
        .bind(run_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn find_run(&self, run_id: Uuid) -> Result<Option<Run>> {
        self.fetch_run(run_id).await
    }

    async fn load_template(&self, template_id: Uuid) -> Result<Option<Template>> {
        let Some(row) = sqlx::query_as::<_, DbTemplate>(
            r#"
            SELECT id, language, source, day_index, created_for_member_id, created_at
            FROM survey_templates
            WHERE id = $1
            "#,
        )
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let questions = sqlx::query_as::<_, DbQuestion>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM survey_questions q WHERE q.template_id = $1 ORDER BY q.position"
        ))
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Question::try_from)
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(Template {
            id: row.id,
            language: row.language,
            source: parse_source(&row.source)?,
            day_index: row.day_index,
            created_for_member_id: row.created_for_member_id,
            questions,
            created_at: row.created_at,
        }))
    }

    async fn create_template(&self, template: NewTemplate) -> Result<Template> {
        let template_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO survey_templates (id, language, source, day_index, created_for_member_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at
            "#,
        )
        .bind(template_id)
        .bind(template.language.as_str())
        .bind(template.source.as_str())
        .bind(template.day_index)
        .bind(template.created_for_member_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(template.questions.len());
        for (position, draft) in template.questions.into_iter().enumerate() {
            let question = Question {
                id: Uuid::new_v4(),
                order: position as i32 + 1,
                text: draft.text,
                qtype: draft.qtype,
                scale_min: draft.scale_min,
                scale_max: draft.scale_max,
                driver_key: draft.driver_key,
                polarity: draft.polarity,
                needs_review: draft.needs_review,
                choices: draft.choices,
                required: draft.required,
            };

            sqlx::query(
                r#"
                INSERT INTO survey_questions
                    (id, template_id, position, question_text, title_hash, question_type,
                     scale_min, scale_max, driver_key, polarity, needs_review, choices, required)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(question.id)
            .bind(template_id)
            .bind(question.order)
            .bind(&question.text)
            .bind(title_hash(&question.text))
            .bind(question.qtype.as_str())
            .bind(question.scale_min)
            .bind(question.scale_max)
            .bind(question.driver_key.as_str())
            .bind(question.polarity.as_str())
            .bind(question.needs_review)
            .bind(question.choices.clone().map(Json))
            .bind(question.required)
            .execute(&mut *tx)
            .await?;

            questions.push(question);
        }

        tx.commit().await?;

        Ok(Template {
            id: template_id,
            language: template.language.as_str().to_string(),
            source: template.source,
            day_index: template.day_index,
            created_for_member_id: template.created_for_member_id,
            questions,
            created_at,
        })
    }

    async fn find_shared_seed_template(
        &self,
        day_index: i32,
        language: Language,
    ) -> Result<Option<Template>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM survey_templates
            WHERE source = 'seed'
              AND created_for_member_id IS NULL
              AND day_index = $1
              AND language = $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(day_index)
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match id {
            Some(id) => self.load_template(id).await,
            None => Ok(None),
        }
    }

    async fn swap_run_template_if_unanswered(
        &self,
        run_id: Uuid,
        template_id: Uuid,
        source: TemplateSource,
    ) -> Result<Option<Run>> {
        let row = sqlx::query_as::<_, DbRun>(&format!(
            r#"
            UPDATE survey_runs
            SET template_id = $2, source = $3
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM survey_responses WHERE run_id = $1)
            RETURNING {RUN_COLUMNS}
            "#
        ))
        .bind(run_id)
        .bind(template_id)
        .bind(source.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Run::try_from).transpose()
    }

    async fn count_responses(&self, run_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM survey_responses WHERE run_id = $1",
        )
        .bind(run_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn append_generation_log(&self, log: NewGenerationLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO generation_logs
                (id, member_id, run_id, template_id, day_index, locale, status, model, attempts, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(log.member_id)
        .bind(log.run_id)
        .bind(log.template_id)
        .bind(log.day_index)
        .bind(&log.locale)
        .bind(log.status.as_str())
        .bind(&log.model)
        .bind(log.attempts)
        .bind(&log.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn generation_failed(
        &self,
        member_id: Uuid,
        run_id: Uuid,
        day_index: i32,
        language: Language,
    ) -> Result<bool> {
        let failed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM generation_logs
                WHERE member_id = $1
                  AND day_index = $2
                  AND locale = $3
                  AND status = 'failed'
                  AND attempts > 0
                  AND (run_id = $4 OR run_id IS NULL)
            )
            "#,
        )
        .bind(member_id)
        .bind(day_index)
        .bind(language.as_str())
        .bind(run_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(failed)
    }

    async fn member_title_hashes(&self, member_id: Uuid) -> Result<HashSet<String>> {
        let hashes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT q.title_hash
            FROM survey_runs r
            JOIN survey_questions q ON q.template_id = r.template_id
            WHERE r.member_id = $1
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(hashes.into_iter().collect())
    }

    async fn recent_question_texts(
        &self,
        member_id: Uuid,
        before: NaiveDate,
        run_limit: i64,
    ) -> Result<Vec<String>> {
        let texts = sqlx::query_scalar::<_, String>(
            r#"
            SELECT q.question_text
            FROM (
                SELECT template_id, run_date
                FROM survey_runs
                WHERE member_id = $1 AND run_date < $2
                ORDER BY run_date DESC
                LIMIT $3
            ) r
            JOIN survey_questions q ON q.template_id = r.template_id
            ORDER BY r.run_date DESC, q.position
            "#,
        )
        .bind(member_id)
        .bind(before)
        .bind(run_limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(texts)
    }

    async fn scored_answers_between(
        &self,
        member_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AnswerRecord>> {
        let rows = sqlx::query_as::<_, DbAnswerRecord>(&format!(
            r#"
            SELECT {QUESTION_COLUMNS}, a.value, r.run_date AS answered_on
            FROM survey_answers a
            JOIN survey_responses s ON s.id = a.response_id
            JOIN survey_runs r ON r.id = s.run_id
            JOIN survey_questions q ON q.id = a.question_id
            WHERE s.member_id = $1
              AND r.run_date BETWEEN $2 AND $3
              AND q.question_type = 'scale'
              AND a.value IS NOT NULL
            ORDER BY s.submitted_at DESC, q.position
            "#
        ))
        .bind(member_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AnswerRecord {
                    question: Question::try_from(row.question)?,
                    value: row.value,
                    answered_on: row.answered_on,
                })
            })
            .collect()
    }

    async fn insert_response(&self, response: NewResponse) -> Result<Response> {
        let response_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO survey_responses
                (id, run_id, member_id, submitted_at, stress_index, engagement_score)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(response_id)
        .bind(response.run_id)
        .bind(response.member_id)
        .bind(response.submitted_at)
        .bind(response.stress_index)
        .bind(response.engagement_score)
        .execute(&mut *tx)
        .await?;

        for answer in &response.answers {
            sqlx::query(
                r#"
                INSERT INTO survey_answers (id, response_id, question_id, value, answer_text, choices)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(response_id)
            .bind(answer.question_id)
            .bind(answer.value)
            .bind(&answer.text)
            .bind(answer.choices.clone().map(Json))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Response {
            id: response_id,
            run_id: response.run_id,
            member_id: response.member_id,
            submitted_at: response.submitted_at,
            stress_index: response.stress_index,
            engagement_score: response.engagement_score,
            answers: response.answers,
        })
    }

    async fn responses_for_run(&self, run_id: Uuid) -> Result<Vec<Response>> {
        let rows = sqlx::query_as::<_, DbResponse>(
            r#"
            SELECT id, run_id, member_id, submitted_at, stress_index, engagement_score
            FROM survey_responses
            WHERE run_id = $1
            ORDER BY submitted_at
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, DbAnswer>(
            r#"
            SELECT a.response_id, a.question_id, a.value, a.answer_text, a.choices
            FROM survey_answers a
            JOIN survey_responses s ON s.id = a.response_id
            WHERE s.run_id = $1
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_response: HashMap<Uuid, Vec<Answer>> = HashMap::new();
        for a in answers {
            by_response.entry(a.response_id).or_default().push(Answer {
                question_id: a.question_id,
                value: a.value,
                text: a.answer_text,
                choices: a.choices.map(|c| c.0),
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Response {
                answers: by_response.remove(&row.id).unwrap_or_default(),
                id: row.id,
                run_id: row.run_id,
                member_id: row.member_id,
                submitted_at: row.submitted_at,
                stress_index: row.stress_index,
                engagement_score: row.engagement_score,
            })
            .collect())
    }

    async fn update_run_aggregates(&self, run_id: Uuid, aggregates: RunAggregates) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE survey_runs
            SET avg_stress_index = $2,
                avg_engagement_score = $3,
                completed_count = $4,
                target_count = $5
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .bind(aggregates.avg_stress_index)
        .bind(aggregates.avg_engagement_score)
        .bind(aggregates.completed_count)
        .bind(aggregates.target_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn trend_samples(&self, scope: TrendScope, range: DateRange) -> Result<Vec<TrendSample>> {
        let rows = match scope {
            TrendScope::Member(member_id) => {
                sqlx::query_as::<_, DbTrendSample>(
                    r#"
                    SELECT r.run_date, s.stress_index, s.engagement_score
                    FROM survey_responses s
                    JOIN survey_runs r ON r.id = s.run_id
                    WHERE s.member_id = $1 AND r.run_date BETWEEN $2 AND $3
                    "#,
                )
                .bind(member_id)
                .bind(range.from)
                .bind(range.to)
                .fetch_all(&self.pool)
                .await?
            }
            TrendScope::Organization(organization_id) => {
                sqlx::query_as::<_, DbTrendSample>(
                    r#"
                    SELECT r.run_date, s.stress_index, s.engagement_score
                    FROM survey_responses s
                    JOIN survey_runs r ON r.id = s.run_id
                    JOIN members m ON m.id = s.member_id
                    WHERE m.organization_id = $1 AND r.run_date BETWEEN $2 AND $3
                    "#,
                )
                .bind(organization_id)
                .bind(range.from)
                .bind(range.to)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| TrendSample {
                date: row.run_date,
                stress: row.stress_index,
                engagement: row.engagement_score,
            })
            .collect())
    }

    async fn latest_response_at(&self, scope: TrendScope) -> Result<Option<DateTime<Utc>>> {
        let latest = match scope {
            TrendScope::Member(member_id) => {
                sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
                    "SELECT MAX(submitted_at) FROM survey_responses WHERE member_id = $1",
                )
                .bind(member_id)
                .fetch_one(&self.pool)
                .await?
            }
            TrendScope::Organization(organization_id) => {
                sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
                    r#"
                    SELECT MAX(s.submitted_at)
                    FROM survey_responses s
                    JOIN members m ON m.id = s.member_id
                    WHERE m.organization_id = $1
                    "#,
                )
                .bind(organization_id)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(latest)
    }
}

#[async_trait]
impl OrgDirectory for PgStore {
    async fn member_settings(&self, member_id: Uuid) -> Result<Option<MemberSettings>> {
        let settings = sqlx::query_as::<_, MemberSettings>(
            r#"
            SELECT
                m.id AS member_id,
                m.organization_id,
                o.timezone,
                o.default_language,
                o.ai_enabled
            FROM members m
            JOIN organizations o ON o.id = m.organization_id
            WHERE m.id = $1 AND m.is_active = TRUE
            "#,
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn organization_language(&self, organization_id: Uuid) -> Result<Option<String>> {
        let language = sqlx::query_scalar::<_, String>(
            "SELECT default_language FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(language)
    }
}
