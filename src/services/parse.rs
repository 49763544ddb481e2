//! Parsing and normalization of untrusted generation output.

use crate::domain::models::{DriverKey, Polarity, QuestionDraft, QuestionType};
use crate::services::generation::GenerationError;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_SCALE: (i32, i32) = (0, 10);

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Vec<QuestionDraft>),
    SchemaError(String),
    EmptyOutput,
}

impl ParseOutcome {
    pub fn into_result(self) -> Result<Vec<QuestionDraft>, GenerationError> {
        match self {
            ParseOutcome::Parsed(drafts) => Ok(drafts),
            ParseOutcome::SchemaError(reason) => Err(GenerationError::Validation(reason)),
            ParseOutcome::EmptyOutput => {
                Err(GenerationError::Validation("empty generation output".to_string()))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawBatch {
    #[serde(default, alias = "items", alias = "survey")]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default, alias = "title", alias = "question", alias = "prompt")]
    text: Option<String>,
    #[serde(default, rename = "type", alias = "questionType", alias = "question_type")]
    qtype: Option<String>,
    #[serde(default, alias = "scale_min", alias = "min")]
    scale_min: Option<Value>,
    #[serde(default, alias = "scale_max", alias = "max")]
    scale_max: Option<Value>,
    #[serde(default, alias = "driver_key", alias = "driver")]
    driver_key: Option<String>,
    #[serde(default)]
    polarity: Option<String>,
    #[serde(default, alias = "needs_review")]
    needs_review: Option<bool>,
    #[serde(default, alias = "choices")]
    options: Option<Value>,
    #[serde(default)]
    required: Option<bool>,
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (```json)
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Outermost `{ ... }` span of the (fence-stripped) text.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let text = strip_code_fences(raw);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn value_as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i32),
        _ => None,
    }
}

fn clean_option(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_start_matches(['-', '*', '•'])
        .trim()
        .to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Array or delimited string → trimmed, de-duplicated list, or `None` when nothing is left.
pub fn normalize_options(value: Option<&Value>) -> Option<Vec<String>> {
    let candidates: Vec<String> = match value? {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => clean_option(s),
                Value::Number(n) => Some(n.to_string()),
                Value::Object(map) => map
                    .get("label")
                    .or_else(|| map.get("text"))
                    .and_then(Value::as_str)
                    .and_then(clean_option),
                _ => None,
            })
            .collect(),
        Value::String(s) => s.split([',', ';', '|', '\n']).filter_map(clean_option).collect(),
        _ => Vec::new(),
    };

    let mut seen = std::collections::HashSet::new();
    let options: Vec<String> = candidates
        .into_iter()
        .filter(|o| seen.insert(o.to_lowercase()))
        .collect();
    (!options.is_empty()).then_some(options)
}

fn normalize_question(index: usize, raw: RawQuestion) -> Result<QuestionDraft, String> {
    let text = raw
        .text
        .as_deref()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("question {index}: missing text"))?;

    let type_label = raw
        .qtype
        .as_deref()
        .ok_or_else(|| format!("question {index}: missing type"))?;
    let qtype = QuestionType::try_from(type_label)
        .map_err(|_| format!("question {index}: unknown type '{type_label}'"))?;

    let driver_key = raw
        .driver_key
        .as_deref()
        .map(DriverKey::parse_loose)
        .unwrap_or(DriverKey::Unknown);
    let polarity = raw
        .polarity
        .as_deref()
        .and_then(|p| Polarity::try_from(p).ok());
    let mut needs_review = raw.needs_review.unwrap_or(false);

    let (scale_min, scale_max) = if qtype == QuestionType::Scale {
        let min = raw.scale_min.as_ref().and_then(value_as_i32).unwrap_or(DEFAULT_SCALE.0);
        let max = raw.scale_max.as_ref().and_then(value_as_i32).unwrap_or(DEFAULT_SCALE.1);
        if max <= min {
            return Err(format!("question {index}: empty scale {min}..{max}"));
        }
        if !driver_key.is_known() || polarity.is_none() {
            needs_review = true;
        }
        (Some(min), Some(max))
    } else {
        (None, None)
    };

    let choices = if qtype.is_choice() {
        let options = normalize_options(raw.options.as_ref());
        if options.is_none() {
            needs_review = true;
        }
        options
    } else {
        None
    };

    Ok(QuestionDraft {
        text,
        qtype,
        scale_min,
        scale_max,
        driver_key,
        polarity: polarity.unwrap_or(Polarity::Negative),
        needs_review,
        choices,
        required: raw.required.unwrap_or(qtype == QuestionType::Scale),
    })
}

pub fn parse_generation_output(raw: &str) -> ParseOutcome {
    if strip_code_fences(raw).is_empty() {
        return ParseOutcome::EmptyOutput;
    }
    let Some(json) = extract_json_object(raw) else {
        return ParseOutcome::SchemaError("no JSON object in output".to_string());
    };
    let batch: RawBatch = match serde_json::from_str(json) {
        Ok(batch) => batch,
        Err(e) => return ParseOutcome::SchemaError(format!("invalid JSON: {e}")),
    };
    let Some(raw_questions) = batch.questions else {
        return ParseOutcome::SchemaError("missing 'questions' array".to_string());
    };
    if raw_questions.is_empty() {
        return ParseOutcome::SchemaError("'questions' is empty".to_string());
    }

    let mut drafts = Vec::with_capacity(raw_questions.len());
    for (index, raw_question) in raw_questions.into_iter().enumerate() {
        match normalize_question(index, raw_question) {
            Ok(draft) => drafts.push(draft),
            Err(reason) => return ParseOutcome::SchemaError(reason),
        }
    }

    let flagged = drafts.iter().filter(|d| d.needs_review).count();
    if flagged > 0 {
        tracing::warn!("{} generated questions flagged for review", flagged);
    }
    ParseOutcome::Parsed(drafts)
}
