use crate::domain::models::{Language, Run, Template};
use crate::state::SharedState;
use crate::time_utils;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct DailySurveyQuery {
    /// Defaults to the member's local calendar date.
    pub date: Option<NaiveDate>,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySurvey {
    pub run_date: NaiveDate,
    pub language: Language,
    pub run: Option<Run>,
    pub template: Option<Template>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:member_id/daily-survey", get(get_daily_survey))
        .with_state(state)
}

async fn get_daily_survey(
    State(state): State<SharedState>,
    Path(member_id): Path<Uuid>,
    Query(query): Query<DailySurveyQuery>,
) -> Result<Json<DailySurvey>, StatusCode> {
    let settings = state
        .org
        .member_settings(member_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load settings for member {}: {}", member_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let language = Language::resolve(query.locale.as_deref(), &settings.default_language);
    let run_date = query
        .date
        .unwrap_or_else(|| time_utils::local_date(&settings.timezone, Utc::now()));

    let run = state
        .lifecycle
        .get_or_create_daily_run(member_id, run_date, language, settings.ai_enabled)
        .await
        .map_err(|e| {
            tracing::error!("Failed to resolve daily run for member {}: {}", member_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let template = match &run {
        Some(run) => state.store.load_template(run.template_id).await.map_err(|e| {
            tracing::error!("Failed to load template {}: {}", run.template_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?,
        None => None,
    };

    Ok(Json(DailySurvey {
        run_date,
        language,
        run,
        template,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TemplateSource;
    use crate::domain::seed_bank;
    use crate::testing::{member_settings, MemoryStore, StaticOrgDirectory};
    use crate::web::test_support;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unknown_member_is_not_found() {
        let state = test_support::state(Arc::new(MemoryStore::new()), StaticOrgDirectory::default());
        let result = get_daily_survey(
            State(state),
            Path(Uuid::new_v4()),
            Query(DailySurveyQuery::default()),
        )
        .await;
        assert_eq!(result.unwrap_err(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_first_day_serves_seed_in_org_language() {
        let member = Uuid::new_v4();
        let store = Arc::new(MemoryStore::new());
        let org = StaticOrgDirectory::default().with_member(member_settings(member, false));
        let state = test_support::state(store.clone(), org);

        let query = DailySurveyQuery {
            date: NaiveDate::from_ymd_opt(2024, 3, 4),
            locale: Some("fr".to_string()),
        };
        let Json(survey) = get_daily_survey(State(state.clone()), Path(member), Query(query))
            .await
            .unwrap();

        assert_eq!(survey.language, Language::Uk);
        let run = survey.run.unwrap();
        assert_eq!(run.day_index, 1);
        assert_eq!(run.source, TemplateSource::Seed);
        let template = survey.template.unwrap();
        assert_eq!(template.id, run.template_id);
        assert_eq!(template.questions.len(), seed_bank::day_set(1).unwrap().len());

        let again = DailySurveyQuery {
            date: NaiveDate::from_ymd_opt(2024, 3, 4),
            locale: None,
        };
        let Json(second) = get_daily_survey(State(state), Path(member), Query(again))
            .await
            .unwrap();
        assert_eq!(second.run.unwrap().id, run.id);
        assert_eq!(store.runs().await.len(), 1);
    }
}
