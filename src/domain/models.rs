use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Questions every accepted AI template carries.
pub const REQUIRED_QUESTION_COUNT: usize = 11;

/// Daily runs are issued to a single member.
pub const DAILY_TARGET_COUNT: i32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Scale,
    Text,
    SingleChoice,
    MultiChoice,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Scale => "scale",
            QuestionType::Text => "text",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultiChoice => "multi_choice",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultiChoice)
    }
}

impl TryFrom<&str> for QuestionType {
    type Error = ();

    /// Canonicalizes the spellings generation output and older rows use.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let key = value.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "scale" | "rating" | "likert" | "slider" | "number" | "numeric" | "scale_0_10"
            | "nps" => Ok(QuestionType::Scale),
            "text" | "open" | "open_text" | "open_ended" | "free_text" | "textarea"
            | "long_text" | "short_text" | "comment" => Ok(QuestionType::Text),
            "single_choice" | "single" | "choice" | "radio" | "select" | "dropdown"
            | "multiple_choice" | "singlechoice" => Ok(QuestionType::SingleChoice),
            "multi_choice" | "multi" | "multiple" | "multi_select" | "multiselect"
            | "checkbox" | "checkboxes" | "multichoice" => Ok(QuestionType::MultiChoice),
            _ => Err(()),
        }
    }
}

/// NEGATIVE: agreement raises stress. POSITIVE: agreement lowers it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Polarity {
    Negative,
    Positive,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Negative => "NEGATIVE",
            Polarity::Positive => "POSITIVE",
        }
    }
}

impl TryFrom<&str> for Polarity {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "negative" | "neg" | "-" | "-1" | "stressor" | "raises_stress" => Ok(Polarity::Negative),
            "positive" | "pos" | "+" | "1" | "+1" | "resource" | "lowers_stress" => {
                Ok(Polarity::Positive)
            }
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DriverKey {
    Workload,
    Meetings,
    Clarity,
    Autonomy,
    Recognition,
    Support,
    Balance,
    Growth,
    /// The single 0-10 overall self-rating; grouped on its own like any driver.
    Overall,
    Unknown,
}

impl DriverKey {
    /// Every stress dimension, in prompt order. `Overall` and `Unknown` are not dimensions.
    pub const ALL: [DriverKey; 8] = [
        DriverKey::Workload,
        DriverKey::Meetings,
        DriverKey::Clarity,
        DriverKey::Autonomy,
        DriverKey::Recognition,
        DriverKey::Support,
        DriverKey::Balance,
        DriverKey::Growth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKey::Workload => "workload",
            DriverKey::Meetings => "meetings",
            DriverKey::Clarity => "clarity",
            DriverKey::Autonomy => "autonomy",
            DriverKey::Recognition => "recognition",
            DriverKey::Support => "support",
            DriverKey::Balance => "balance",
            DriverKey::Growth => "growth",
            DriverKey::Overall => "overall",
            DriverKey::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DriverKey::Unknown)
    }

    /// Lenient parse; anything unrecognised becomes `Unknown`.
    pub fn parse_loose(value: &str) -> DriverKey {
        let key = value.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "workload" | "work_load" | "load" | "pace" | "deadlines" => DriverKey::Workload,
            "meetings" | "meeting" | "meeting_load" | "interruptions" => DriverKey::Meetings,
            "clarity" | "role_clarity" | "priorities" | "goals" => DriverKey::Clarity,
            "autonomy" | "control" | "ownership" => DriverKey::Autonomy,
            "recognition" | "appreciation" | "feedback" => DriverKey::Recognition,
            "support" | "manager_support" | "team_support" | "team" => DriverKey::Support,
            "balance" | "work_life" | "worklife" | "work_life_balance" | "recovery" => {
                DriverKey::Balance
            }
            "growth" | "development" | "learning" | "career" => DriverKey::Growth,
            "overall" | "general" | "overall_stress" => DriverKey::Overall,
            _ => DriverKey::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSource {
    Seed,
    Ai,
    Manual,
}

impl TemplateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateSource::Seed => "seed",
            TemplateSource::Ai => "ai",
            TemplateSource::Manual => "manual",
        }
    }
}

impl TryFrom<&str> for TemplateSource {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "seed" => Ok(TemplateSource::Seed),
            "ai" => Ok(TemplateSource::Ai),
            "manual" => Ok(TemplateSource::Manual),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Uk,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Uk => "uk",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Uk => "Ukrainian",
        }
    }

    /// Accepts `uk`, `uk-UA`, `uk_UA`, `ua`, `en-GB`, ...
    pub fn from_locale(raw: &str) -> Option<Language> {
        let primary = raw
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match primary.as_str() {
            "en" => Some(Language::En),
            "uk" | "ua" => Some(Language::Uk),
            _ => None,
        }
    }

    /// Requested locale first, then the organization default, then English.
    pub fn resolve(requested: Option<&str>, org_default: &str) -> Language {
        requested
            .and_then(Language::from_locale)
            .or_else(|| Language::from_locale(org_default))
            .unwrap_or(Language::En)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub order: i32,
    pub text: String,
    #[serde(rename = "type")]
    pub qtype: QuestionType,
    pub scale_min: Option<i32>,
    pub scale_max: Option<i32>,
    pub driver_key: DriverKey,
    pub polarity: Polarity,
    pub needs_review: bool,
    pub choices: Option<Vec<String>>,
    pub required: bool,
}

/// A question before it has been persisted. Order comes from its position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: String,
    #[serde(rename = "type")]
    pub qtype: QuestionType,
    pub scale_min: Option<i32>,
    pub scale_max: Option<i32>,
    pub driver_key: DriverKey,
    pub polarity: Polarity,
    pub needs_review: bool,
    pub choices: Option<Vec<String>>,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub language: String,
    pub source: TemplateSource,
    pub day_index: i32,
    pub created_for_member_id: Option<Uuid>,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn question(&self, id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub language: Language,
    pub source: TemplateSource,
    pub day_index: i32,
    pub created_for_member_id: Option<Uuid>,
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: Uuid,
    pub member_id: Uuid,
    pub template_id: Uuid,
    pub run_date: NaiveDate,
    pub source: TemplateSource,
    pub day_index: i32,
    pub avg_stress_index: Option<f64>,
    pub avg_engagement_score: Option<f64>,
    pub completed_count: i32,
    pub target_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRun {
    pub member_id: Uuid,
    pub template_id: Uuid,
    pub run_date: NaiveDate,
    pub source: TemplateSource,
    pub day_index: i32,
    pub target_count: i32,
}

/// Outcome of the unique-constrained daily run insert.
#[derive(Debug, Clone)]
pub enum RunInsert {
    Created(Run),
    /// Another caller won the `(member_id, run_date)` race.
    Existing(Run),
}

impl RunInsert {
    pub fn into_run(self) -> Run {
        match self {
            RunInsert::Created(run) | RunInsert::Existing(run) => run,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunAggregates {
    pub avg_stress_index: Option<f64>,
    pub avg_engagement_score: Option<f64>,
    pub completed_count: i32,
    pub target_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: Uuid,
    pub value: Option<f64>,
    pub text: Option<String>,
    pub choices: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: Uuid,
    pub run_id: Uuid,
    pub member_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub stress_index: Option<f64>,
    pub engagement_score: Option<f64>,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone)]
pub struct NewResponse {
    pub run_id: Uuid,
    pub member_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub stress_index: Option<f64>,
    pub engagement_score: Option<f64>,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Success => "success",
            GenerationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGenerationLog {
    pub member_id: Uuid,
    pub run_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub day_index: i32,
    pub locale: String,
    pub status: GenerationStatus,
    pub model: Option<String>,
    pub attempts: i32,
    pub error: Option<String>,
}

/// A scale answer with the metadata needed to score it, as read back from storage.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub question: Question,
    pub value: Option<f64>,
    pub answered_on: NaiveDate,
}

/// Grounding sample handed to the generator prompt.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSample {
    pub text: String,
    pub value: f64,
    pub driver_key: DriverKey,
    pub polarity: Polarity,
}
