//! Daily run lifecycle: seed vs AI vs unique-shuffle policy, idempotent creation,
//! and the pre-answer upgrade of a seed run to an AI run.

use crate::db::SurveyStore;
use crate::domain::models::{
    GenerationStatus, Language, NewGenerationLog, NewRun, Run, RunInsert, Template,
    TemplateSource, DAILY_TARGET_COUNT,
};
use crate::domain::seed_bank::{self, SEED_DAYS};
use crate::services::question_generator::{GenerationReport, QuestionGenerator};
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-process claims on `(member, date)` so concurrent first requests wait for one
/// creation instead of each running a generation cycle.
type CreationClaims = Arc<Mutex<HashMap<(Uuid, NaiveDate), Arc<Mutex<()>>>>>;

enum Produced {
    Ai {
        template: Template,
        model: Option<String>,
        attempts: i32,
    },
    Seed(Template),
    Nothing,
}

#[derive(Clone)]
pub struct RunLifecycle {
    store: Arc<dyn SurveyStore>,
    generator: Option<Arc<QuestionGenerator>>,
    creating: CreationClaims,
}

impl RunLifecycle {
    /// `generator` is `None` when no text-generation backend is configured.
    pub fn new(store: Arc<dyn SurveyStore>, generator: Option<Arc<QuestionGenerator>>) -> Self {
        Self {
            store,
            generator,
            creating: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn SurveyStore> {
        &self.store
    }

    fn ai_generator(&self, allow_ai: bool) -> Option<&QuestionGenerator> {
        self.generator.as_deref().filter(|_| allow_ai)
    }

    /// Today's run for the member, creating it when missing.
    ///
    /// `Ok(None)` is "no survey today", not a failure. Storage errors still propagate.
    pub async fn get_or_create_daily_run(
        &self,
        member_id: Uuid,
        run_date: NaiveDate,
        language: Language,
        allow_ai: bool,
    ) -> Result<Option<Run>> {
        if let Some(existing) = self.store.find_daily_run(member_id, run_date).await? {
            let run = self
                .maybe_upgrade_daily_run_to_ai(existing, language, allow_ai)
                .await?;
            return Ok(Some(run));
        }

        let key = (member_id, run_date);
        let claim = self
            .creating
            .lock()
            .await
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let created = {
            let _held = claim.lock().await;
            self.create_daily_run(member_id, run_date, language, allow_ai)
                .await
        };
        self.creating.lock().await.remove(&key);
        created
    }

    /// Creation path behind the in-process claim. The unique `(member_id, run_date)`
    /// insert still settles races between processes.
    async fn create_daily_run(
        &self,
        member_id: Uuid,
        run_date: NaiveDate,
        language: Language,
        allow_ai: bool,
    ) -> Result<Option<Run>> {
        if let Some(existing) = self.store.find_daily_run(member_id, run_date).await? {
            return Ok(Some(existing));
        }

        let day_index = self.store.count_daily_runs_before(member_id, run_date).await? as i32 + 1;
        let produced = self
            .produce_template(member_id, run_date, day_index, language, allow_ai)
            .await?;

        let (template, ai_detail) = match produced {
            Produced::Ai {
                template,
                model,
                attempts,
            } => (template, Some((model, attempts))),
            Produced::Seed(template) => (template, None),
            Produced::Nothing => return Ok(None),
        };

        let insert = self
            .store
            .insert_daily_run(NewRun {
                member_id,
                template_id: template.id,
                run_date,
                source: template.source,
                day_index,
                target_count: DAILY_TARGET_COUNT,
            })
            .await?;

        let (run, won) = match insert {
            RunInsert::Created(run) => {
                tracing::info!(
                    "Created {} run {} for member {} on {} (day {})",
                    run.source.as_str(),
                    run.id,
                    member_id,
                    run_date,
                    day_index
                );
                (run, true)
            }
            RunInsert::Existing(run) => {
                tracing::info!(
                    "Run for member {} on {} created concurrently, reusing {}",
                    member_id,
                    run_date,
                    run.id
                );
                (run, false)
            }
        };

        if let Some((model, attempts)) = ai_detail {
            self.log(NewGenerationLog {
                member_id,
                run_id: won.then_some(run.id),
                template_id: Some(template.id),
                day_index,
                locale: language.as_str().to_string(),
                status: GenerationStatus::Success,
                model,
                attempts,
                error: (!won).then(|| "run created concurrently; template unused".to_string()),
            })
            .await;
        }

        Ok(Some(run))
    }

    /// Day policy: AI whenever allowed, otherwise (or on failure) the canonical seed
    /// day, and past the seed days the member's unique shuffle of the seed pool.
    async fn produce_template(
        &self,
        member_id: Uuid,
        run_date: NaiveDate,
        day_index: i32,
        language: Language,
        allow_ai: bool,
    ) -> Result<Produced> {
        if let Some(generator) = self.ai_generator(allow_ai) {
            let report = generator
                .generate_template(member_id, run_date, day_index, language)
                .await;
            let model = report.model().map(str::to_string);
            let attempts = report.call_count();
            match report.result {
                Ok(template) => {
                    return Ok(Produced::Ai {
                        template,
                        model,
                        attempts,
                    })
                }
                Err(e) => {
                    self.log(NewGenerationLog {
                        member_id,
                        run_id: None,
                        template_id: None,
                        day_index,
                        locale: language.as_str().to_string(),
                        status: GenerationStatus::Failed,
                        model,
                        attempts,
                        error: Some(e.to_string()),
                    })
                    .await;
                }
            }
        }

        if day_index <= SEED_DAYS {
            let template = match self.store.find_shared_seed_template(day_index, language).await? {
                Some(existing) => existing,
                None => match seed_bank::seed_day_template(day_index, language) {
                    Some(new_template) => self.store.create_template(new_template).await?,
                    None => return Ok(Produced::Nothing),
                },
            };
            return Ok(Produced::Seed(template));
        }

        let seen = self.store.member_title_hashes(member_id).await?;
        match seed_bank::unique_shuffle_template(member_id, day_index, language, &seen) {
            Some(new_template) => Ok(Produced::Seed(self.store.create_template(new_template).await?)),
            None => {
                self.log(NewGenerationLog {
                    member_id,
                    run_id: None,
                    template_id: None,
                    day_index,
                    locale: language.as_str().to_string(),
                    status: GenerationStatus::Failed,
                    model: None,
                    attempts: 0,
                    error: Some("seed pool exhausted for member; no survey today".to_string()),
                })
                .await;
                Ok(Produced::Nothing)
            }
        }
    }

    /// Regenerates an unanswered run with AI when AI became available or the template
    /// language no longer matches. Returns the (possibly unchanged) run.
    pub async fn maybe_upgrade_daily_run_to_ai(
        &self,
        run: Run,
        language: Language,
        allow_ai: bool,
    ) -> Result<Run> {
        let Some(generator) = self.ai_generator(allow_ai) else {
            return Ok(run);
        };

        let language_matches = match self.store.load_template(run.template_id).await? {
            Some(template) => template.language == language.as_str(),
            None => false,
        };
        if run.source == TemplateSource::Ai && language_matches {
            return Ok(run);
        }
        if self.store.count_responses(run.id).await? > 0 {
            return Ok(run);
        }
        // One failed generation per run and locale; later reads keep the current template.
        if self
            .store
            .generation_failed(run.member_id, run.id, run.day_index, language)
            .await?
        {
            tracing::debug!(
                "Skipping upgrade of run {}: generation already failed for {}",
                run.id,
                language.as_str()
            );
            return Ok(run);
        }

        tracing::info!(
            "Upgrading run {} for member {} (source {}, language match {})",
            run.id,
            run.member_id,
            run.source.as_str(),
            language_matches
        );

        let report: GenerationReport = generator
            .generate_template(run.member_id, run.run_date, run.day_index, language)
            .await;
        let model = report.model().map(str::to_string);
        let attempts = report.call_count();

        let template = match report.result {
            Ok(template) => template,
            Err(e) => {
                self.log(NewGenerationLog {
                    member_id: run.member_id,
                    run_id: Some(run.id),
                    template_id: None,
                    day_index: run.day_index,
                    locale: language.as_str().to_string(),
                    status: GenerationStatus::Failed,
                    model,
                    attempts,
                    error: Some(e.to_string()),
                })
                .await;
                return Ok(run);
            }
        };

        // The swap re-checks for responses in the same statement.
        let swapped = self
            .store
            .swap_run_template_if_unanswered(run.id, template.id, TemplateSource::Ai)
            .await?;

        let (result, error) = match swapped {
            Some(updated) => (updated, None),
            None => {
                tracing::info!("Run {} was answered during upgrade, keeping its template", run.id);
                let current = self.store.find_run(run.id).await?.unwrap_or(run);
                (
                    current,
                    Some("run answered before swap; template unused".to_string()),
                )
            }
        };

        self.log(NewGenerationLog {
            member_id: result.member_id,
            run_id: Some(result.id),
            template_id: Some(template.id),
            day_index: result.day_index,
            locale: language.as_str().to_string(),
            status: GenerationStatus::Success,
            model,
            attempts,
            error,
        })
        .await;

        Ok(result)
    }

    /// Generation logs are an audit trail; failing to write one never fails the request.
    async fn log(&self, entry: NewGenerationLog) {
        if let Err(e) = self.store.append_generation_log(entry).await {
            tracing::error!("Failed to write generation log: {}", e);
        }
    }
}
