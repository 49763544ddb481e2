//! Adaptive daily question generation.
//!
//! One cycle: build context, request from the primary model (falling back once to the
//! secondary model on a validation or upstream failure), dedupe, fill a shortfall with
//! exactly one more request, check the batch against the member's full question
//! history, then persist. Any failed step aborts the cycle and nothing is saved.

use crate::db::SurveyStore;
use crate::domain::models::{DriverKey, Language, NewTemplate, QuestionDraft, Template, TemplateSource};
use crate::domain::titles::{normalize_title, title_hash};
use crate::services::context::{load_context, ContextSnapshot};
use crate::services::generation::{GenerationError, GeneratorSettings, TextGenerator};
use crate::services::parse::parse_generation_output;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Primary,
    Fallback,
    Fill,
}

impl Stage {
    /// Where a retryable failure at this stage leads. `None` means abort.
    pub fn after_failure(self) -> Option<Stage> {
        match self {
            Stage::Primary => Some(Stage::Fallback),
            Stage::Fallback | Stage::Fill => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Parsed { questions: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct Attempt {
    pub stage: Stage,
    pub model: String,
    pub outcome: AttemptOutcome,
}

#[derive(Debug)]
pub struct GenerationReport {
    pub attempts: Vec<Attempt>,
    pub result: Result<Template, GenerationError>,
}

impl GenerationReport {
    /// Model whose batch was accepted (or last parsed), if any.
    pub fn model(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find(|a| a.stage != Stage::Fill && matches!(a.outcome, AttemptOutcome::Parsed { .. }))
            .map(|a| a.model.as_str())
    }

    pub fn call_count(&self) -> i32 {
        self.attempts.len() as i32
    }
}

pub fn dedupe_by_title(drafts: Vec<QuestionDraft>) -> Vec<QuestionDraft> {
    let mut seen = HashSet::new();
    drafts
        .into_iter()
        .filter(|d| seen.insert(normalize_title(&d.text)))
        .collect()
}

fn driver_list() -> String {
    DriverKey::ALL
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

const QUESTION_SCHEMA: &str = r#"Return ONLY a JSON object of the form {"questions": [...]}, no commentary.
Each question object has:
- "text": the question or statement
- "type": "scale" | "text" | "single_choice"
- "scaleMin", "scaleMax": integers, scale questions only
- "driverKey": the stress driver the question measures
- "polarity": "NEGATIVE" when agreeing means more stress, "POSITIVE" when agreeing means less
- "needsReview": true when you are not confident about driverKey or polarity
- "options": array of answer options, single_choice only"#;

pub fn build_instructions(language: Language, required: usize) -> String {
    format!(
        r#"You write short daily workplace wellbeing check-ins for one employee.
{QUESTION_SCHEMA}

Produce exactly {required} questions in this composition:
- exactly 1 overall stress rating: type "scale", scaleMin 0, scaleMax 10, driverKey "overall"
- 6 to 8 driver statements: type "scale", scaleMin 1, scaleMax 5 (agreement), driverKey one of: {drivers}
- 1 to 2 open questions: type "text"
- exactly 1 "what would help you most right now" question: type "single_choice" with 4 to 6 options

Never reuse or paraphrase any question from the avoid list.
Write every question and option in {language_name}."#,
        drivers = driver_list(),
        language_name = language.display_name(),
    )
}

pub fn build_fill_instructions(language: Language, shortfall: usize) -> String {
    format!(
        r#"You add questions to an existing workplace wellbeing check-in.
{QUESTION_SCHEMA}

Produce exactly {shortfall} additional question(s). Prefer type "scale" driver statements
(scaleMin 1, scaleMax 5) with driverKey one of: {drivers}.
Every new question must differ from every title in the exclusion list.
Write every question in {language_name}."#,
        drivers = driver_list(),
        language_name = language.display_name(),
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none)".to_string();
    }
    items
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(context: &ContextSnapshot, day_index: i32, language: Language) -> String {
    let drivers = serde_json::to_string(&context.drivers).unwrap_or_default();
    let samples = serde_json::to_string(&context.answer_samples).unwrap_or_default();
    let missing: Vec<String> = context
        .missing_drivers
        .iter()
        .map(|d| d.as_str().to_string())
        .collect();

    format!(
        "Check-in day {day_index}, language {language}.\n\
         Driver stress (0-10) over the last 7 days with change vs the 7 days before:\n{drivers}\n\
         Under-sampled drivers, cover these first: {missing}\n\
         Recent answers for grounding:\n{samples}\n\
         Avoid list (recently asked):\n{avoid}",
        language = language.as_str(),
        missing = missing.join(", "),
        avoid = bullet_list(&context.recent_questions),
    )
}

pub fn build_fill_prompt(
    context: &ContextSnapshot,
    accepted: &[QuestionDraft],
    shortfall: usize,
) -> String {
    let mut excluded: Vec<String> = accepted.iter().map(|d| d.text.clone()).collect();
    excluded.extend(context.recent_questions.iter().cloned());
    let missing: Vec<&str> = context.missing_drivers.iter().map(|d| d.as_str()).collect();
    format!(
        "Need exactly {shortfall} more question(s).\n\
         Under-sampled drivers: {missing}\n\
         Exclusion list:\n{excluded}",
        missing = missing.join(", "),
        excluded = bullet_list(&excluded),
    )
}

pub struct QuestionGenerator {
    store: Arc<dyn SurveyStore>,
    client: Arc<dyn TextGenerator>,
    settings: GeneratorSettings,
}

impl QuestionGenerator {
    pub fn new(
        store: Arc<dyn SurveyStore>,
        client: Arc<dyn TextGenerator>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            store,
            client,
            settings,
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Configured model of a request stage. Fill has none: it reuses the model
    /// whose batch was accepted.
    fn model_for(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Primary => Some(&self.settings.primary_model),
            Stage::Fallback => Some(&self.settings.fallback_model),
            Stage::Fill => None,
        }
    }

    /// One bounded call plus parse. Expiry counts as an upstream failure.
    async fn request(
        &self,
        stage: Stage,
        model: &str,
        instructions: &str,
        prompt: &str,
        attempts: &mut Vec<Attempt>,
    ) -> Result<Vec<QuestionDraft>, GenerationError> {
        let call = self
            .client
            .generate(model, instructions, prompt, self.settings.max_output_tokens);
        let result = match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(Ok(raw)) => parse_generation_output(&raw).into_result(),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(GenerationError::UpstreamUnavailable(format!(
                "{model} timed out after {}ms",
                self.settings.timeout.as_millis()
            ))),
        };

        attempts.push(Attempt {
            stage,
            model: model.to_string(),
            outcome: match &result {
                Ok(drafts) => AttemptOutcome::Parsed {
                    questions: drafts.len(),
                },
                Err(e) => AttemptOutcome::Failed {
                    reason: e.to_string(),
                },
            },
        });
        result
    }

    #[instrument(skip(self))]
    pub async fn generate_template(
        &self,
        member_id: Uuid,
        run_date: NaiveDate,
        day_index: i32,
        language: Language,
    ) -> GenerationReport {
        let mut attempts = Vec::new();
        let result = self
            .run_cycle(member_id, run_date, day_index, language, &mut attempts)
            .await;
        if let Err(e) = &result {
            tracing::error!(
                "Generation aborted for member {} day {} after {} call(s): {}",
                member_id,
                day_index,
                attempts.len(),
                e
            );
        }
        GenerationReport { attempts, result }
    }

    async fn run_cycle(
        &self,
        member_id: Uuid,
        run_date: NaiveDate,
        day_index: i32,
        language: Language,
        attempts: &mut Vec<Attempt>,
    ) -> Result<Template, GenerationError> {
        let required = self.settings.required_count;
        let context = load_context(self.store.as_ref(), member_id, run_date).await?;
        let instructions = build_instructions(language, required);
        let prompt = build_prompt(&context, day_index, language);

        let mut stage = Stage::Primary;
        let (drafts, model) = loop {
            let Some(model) = self.model_for(stage).map(str::to_string) else {
                return Err(GenerationError::Validation(format!(
                    "no configured model for {} stage",
                    stage_name(stage)
                )));
            };
            match self
                .request(stage, &model, &instructions, &prompt, attempts)
                .await
            {
                Ok(drafts) => break (drafts, model),
                Err(e) => match stage.after_failure() {
                    Some(next) if e.is_retryable() => {
                        tracing::warn!("{} model {} failed ({}), trying {:?}", stage_name(stage), model, e, next);
                        stage = next;
                    }
                    _ => return Err(e),
                },
            }
        };

        let mut batch = dedupe_by_title(drafts);
        if batch.len() < required {
            let shortfall = required - batch.len();
            tracing::info!("Batch from {} short by {}, requesting fill", model, shortfall);
            let fill = self
                .request(
                    Stage::Fill,
                    &model,
                    &build_fill_instructions(language, shortfall),
                    &build_fill_prompt(&context, &batch, shortfall),
                    attempts,
                )
                .await;
            match fill {
                Ok(extra) => {
                    batch.extend(extra);
                    batch = dedupe_by_title(batch);
                }
                Err(e) => tracing::warn!("Fill request failed: {}", e),
            }
            if batch.len() < required {
                return Err(GenerationError::InsufficientQuestions {
                    got: batch.len(),
                    required,
                });
            }
        }
        batch.truncate(required);

        let history = self.store.member_title_hashes(member_id).await?;
        let collisions: Vec<String> = batch
            .iter()
            .filter(|d| history.contains(&title_hash(&d.text)))
            .map(|d| d.text.clone())
            .collect();
        if !collisions.is_empty() {
            return Err(GenerationError::HistoryCollision { titles: collisions });
        }

        let template = self
            .store
            .create_template(NewTemplate {
                language,
                source: TemplateSource::Ai,
                day_index,
                created_for_member_id: Some(member_id),
                questions: batch,
            })
            .await?;

        tracing::info!(
            "Accepted AI template {} for member {} day {} from {}",
            template.id,
            member_id,
            day_index,
            model
        );
        Ok(template)
    }
}

fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Primary => "primary",
        Stage::Fallback => "fallback",
        Stage::Fill => "fill",
    }
}
