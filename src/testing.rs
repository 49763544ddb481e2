//! In-memory collaborators for service tests.

use crate::analytics::trend::{DateRange, TrendSample, TrendScope};
use crate::db::SurveyStore;
use crate::domain::models::{
    AnswerRecord, GenerationStatus, Language, NewGenerationLog, NewResponse, NewRun, NewTemplate,
    Question, QuestionType, Response, Run, RunAggregates, RunInsert, Template, TemplateSource,
};
use crate::domain::titles::title_hash;
use crate::services::generation::{GenerationError, TextGenerator};
use crate::services::org::{MemberSettings, OrgDirectory};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    templates: HashMap<Uuid, Template>,
    runs: Vec<Run>,
    responses: Vec<Response>,
    logs: Vec<NewGenerationLog>,
    member_orgs: HashMap<Uuid, Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_member(&self, member_id: Uuid, organization_id: Uuid) {
        self.inner
            .lock()
            .await
            .member_orgs
            .insert(member_id, organization_id);
    }

    pub async fn logs(&self) -> Vec<NewGenerationLog> {
        self.inner.lock().await.logs.clone()
    }

    pub async fn runs(&self) -> Vec<Run> {
        self.inner.lock().await.runs.clone()
    }

    pub async fn template_count(&self) -> usize {
        self.inner.lock().await.templates.len()
    }
}

fn materialize(template: NewTemplate) -> Template {
    Template {
        id: Uuid::new_v4(),
        language: template.language.as_str().to_string(),
        source: template.source,
        day_index: template.day_index,
        created_for_member_id: template.created_for_member_id,
        questions: template
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, d)| Question {
                id: Uuid::new_v4(),
                order: i as i32 + 1,
                text: d.text,
                qtype: d.qtype,
                scale_min: d.scale_min,
                scale_max: d.scale_max,
                driver_key: d.driver_key,
                polarity: d.polarity,
                needs_review: d.needs_review,
                choices: d.choices,
                required: d.required,
            })
            .collect(),
        created_at: Utc::now(),
    }
}

impl Inner {
    fn in_scope(&self, scope: TrendScope, member_id: Uuid) -> bool {
        match scope {
            TrendScope::Member(id) => id == member_id,
            TrendScope::Organization(org) => self.member_orgs.get(&member_id) == Some(&org),
        }
    }

    fn run(&self, run_id: Uuid) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == run_id)
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn find_daily_run(&self, member_id: Uuid, run_date: NaiveDate) -> Result<Option<Run>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .runs
            .iter()
            .find(|r| r.member_id == member_id && r.run_date == run_date)
            .cloned())
    }

    async fn insert_daily_run(&self, run: NewRun) -> Result<RunInsert> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .runs
            .iter()
            .find(|r| r.member_id == run.member_id && r.run_date == run.run_date)
        {
            return Ok(RunInsert::Existing(existing.clone()));
        }
        let created = Run {
            id: Uuid::new_v4(),
            member_id: run.member_id,
            template_id: run.template_id,
            run_date: run.run_date,
            source: run.source,
            day_index: run.day_index,
            avg_stress_index: None,
            avg_engagement_score: None,
            completed_count: 0,
            target_count: run.target_count,
            created_at: Utc::now(),
        };
        inner.runs.push(created.clone());
        Ok(RunInsert::Created(created))
    }

    async fn count_daily_runs_before(&self, member_id: Uuid, run_date: NaiveDate) -> Result<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .runs
            .iter()
            .filter(|r| r.member_id == member_id && r.run_date < run_date)
            .count() as i64)
    }

    async fn find_run(&self, run_id: Uuid) -> Result<Option<Run>> {
        Ok(self.inner.lock().await.run(run_id).cloned())
    }

    async fn load_template(&self, template_id: Uuid) -> Result<Option<Template>> {
        Ok(self.inner.lock().await.templates.get(&template_id).cloned())
    }

    async fn create_template(&self, template: NewTemplate) -> Result<Template> {
        let created = materialize(template);
        self.inner
            .lock()
            .await
            .templates
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_shared_seed_template(
        &self,
        day_index: i32,
        language: Language,
    ) -> Result<Option<Template>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .templates
            .values()
            .find(|t| {
                t.source == TemplateSource::Seed
                    && t.created_for_member_id.is_none()
                    && t.day_index == day_index
                    && t.language == language.as_str()
            })
            .cloned())
    }

    async fn swap_run_template_if_unanswered(
        &self,
        run_id: Uuid,
        template_id: Uuid,
        source: TemplateSource,
    ) -> Result<Option<Run>> {
        let mut inner = self.inner.lock().await;
        if inner.responses.iter().any(|r| r.run_id == run_id) {
            return Ok(None);
        }
        let Some(run) = inner.runs.iter_mut().find(|r| r.id == run_id) else {
            return Ok(None);
        };
        run.template_id = template_id;
        run.source = source;
        Ok(Some(run.clone()))
    }

    async fn count_responses(&self, run_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.responses.iter().filter(|r| r.run_id == run_id).count() as i64)
    }

    async fn append_generation_log(&self, log: NewGenerationLog) -> Result<()> {
        self.inner.lock().await.logs.push(log);
        Ok(())
    }

    async fn generation_failed(
        &self,
        member_id: Uuid,
        run_id: Uuid,
        day_index: i32,
        language: Language,
    ) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.logs.iter().any(|l| {
            l.member_id == member_id
                && l.day_index == day_index
                && l.locale == language.as_str()
                && l.status == GenerationStatus::Failed
                && l.attempts > 0
                && l.run_id.map_or(true, |id| id == run_id)
        }))
    }

    async fn member_title_hashes(&self, member_id: Uuid) -> Result<HashSet<String>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .runs
            .iter()
            .filter(|r| r.member_id == member_id)
            .filter_map(|r| inner.templates.get(&r.template_id))
            .flat_map(|t| t.questions.iter().map(|q| title_hash(&q.text)))
            .collect())
    }

    async fn recent_question_texts(
        &self,
        member_id: Uuid,
        before: NaiveDate,
        run_limit: i64,
    ) -> Result<Vec<String>> {
        let inner = self.inner.lock().await;
        let mut runs: Vec<&Run> = inner
            .runs
            .iter()
            .filter(|r| r.member_id == member_id && r.run_date < before)
            .collect();
        runs.sort_by(|a, b| b.run_date.cmp(&a.run_date));
        Ok(runs
            .into_iter()
            .take(run_limit.max(0) as usize)
            .filter_map(|r| inner.templates.get(&r.template_id))
            .flat_map(|t| t.questions.iter().map(|q| q.text.clone()))
            .collect())
    }

    async fn scored_answers_between(
        &self,
        member_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AnswerRecord>> {
        let inner = self.inner.lock().await;
        let mut responses: Vec<&Response> = inner
            .responses
            .iter()
            .filter(|r| r.member_id == member_id)
            .collect();
        responses.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        let mut records = Vec::new();
        for response in responses {
            let Some(run) = inner.run(response.run_id) else {
                continue;
            };
            if run.run_date < from || run.run_date > to {
                continue;
            }
            let Some(template) = inner.templates.get(&run.template_id) else {
                continue;
            };
            for answer in &response.answers {
                let Some(question) = template.question(answer.question_id) else {
                    continue;
                };
                if question.qtype == QuestionType::Scale && answer.value.is_some() {
                    records.push(AnswerRecord {
                        question: question.clone(),
                        value: answer.value,
                        answered_on: run.run_date,
                    });
                }
            }
        }
        Ok(records)
    }

    async fn insert_response(&self, response: NewResponse) -> Result<Response> {
        let stored = Response {
            id: Uuid::new_v4(),
            run_id: response.run_id,
            member_id: response.member_id,
            submitted_at: response.submitted_at,
            stress_index: response.stress_index,
            engagement_score: response.engagement_score,
            answers: response.answers,
        };
        self.inner.lock().await.responses.push(stored.clone());
        Ok(stored)
    }

    async fn responses_for_run(&self, run_id: Uuid) -> Result<Vec<Response>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .responses
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn update_run_aggregates(&self, run_id: Uuid, aggregates: RunAggregates) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let run = inner
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| anyhow!("run {run_id} not found"))?;
        run.avg_stress_index = aggregates.avg_stress_index;
        run.avg_engagement_score = aggregates.avg_engagement_score;
        run.completed_count = aggregates.completed_count;
        run.target_count = aggregates.target_count;
        Ok(())
    }

    async fn trend_samples(&self, scope: TrendScope, range: DateRange) -> Result<Vec<TrendSample>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .responses
            .iter()
            .filter(|r| inner.in_scope(scope, r.member_id))
            .filter_map(|r| {
                let run = inner.run(r.run_id)?;
                range.contains(run.run_date).then_some(TrendSample {
                    date: run.run_date,
                    stress: r.stress_index,
                    engagement: r.engagement_score,
                })
            })
            .collect())
    }

    async fn latest_response_at(&self, scope: TrendScope) -> Result<Option<DateTime<Utc>>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .responses
            .iter()
            .filter(|r| inner.in_scope(scope, r.member_id))
            .map(|r| r.submitted_at)
            .max())
    }
}

#[derive(Default)]
pub struct StaticOrgDirectory {
    members: HashMap<Uuid, MemberSettings>,
}

impl StaticOrgDirectory {
    pub fn with_member(mut self, settings: MemberSettings) -> Self {
        self.members.insert(settings.member_id, settings);
        self
    }
}

#[async_trait]
impl OrgDirectory for StaticOrgDirectory {
    async fn member_settings(&self, member_id: Uuid) -> Result<Option<MemberSettings>> {
        Ok(self.members.get(&member_id).cloned())
    }

    async fn organization_language(&self, organization_id: Uuid) -> Result<Option<String>> {
        Ok(self
            .members
            .values()
            .find(|m| m.organization_id == organization_id)
            .map(|m| m.default_language.clone()))
    }
}

pub enum Scripted {
    Reply(String),
    Fail(String),
    Stall(Duration),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
}

/// Replays canned generator outputs in order; an exhausted script is an upstream failure.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: StdMutex<VecDeque<Scripted>>,
    calls: StdMutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: StdMutex::new(script.into()),
            calls: StdMutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        model: &str,
        _instructions: &str,
        prompt: &str,
        _max_output_tokens: u16,
    ) -> Result<String, GenerationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
            });
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Scripted::Reply(raw)) => Ok(raw),
            Some(Scripted::Fail(reason)) => Err(GenerationError::UpstreamUnavailable(reason)),
            Some(Scripted::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(String::new())
            }
            None => Err(GenerationError::UpstreamUnavailable("script exhausted".to_string())),
        }
    }
}

/// `count` distinct 1-5 workload statements as a generator reply body.
pub fn questions_json(prefix: &str, count: usize) -> String {
    let questions: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "text": format!("{prefix} statement number {i}"),
                "type": "scale",
                "scaleMin": 1,
                "scaleMax": 5,
                "driverKey": "workload",
                "polarity": "NEGATIVE",
                "needsReview": false
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

pub fn member_settings(member_id: Uuid, ai_enabled: bool) -> MemberSettings {
    MemberSettings {
        member_id,
        organization_id: Uuid::nil(),
        timezone: "Europe/Kyiv".to_string(),
        default_language: "uk".to_string(),
        ai_enabled,
    }
}
