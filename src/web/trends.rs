use crate::analytics::trend::{DateRange, TrendScope};
use crate::domain::models::Language;
use crate::services::trends::{get_trend, TrendReport};
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Member,
    Organization,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub scope: ScopeKind,
    pub id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub locale: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new().route("/", get(get_trends)).with_state(state)
}

/// Explicit bounds must both be present and ordered; without them the trailing
/// month ending `today` is used.
fn resolve_range(query: &TrendQuery, today: NaiveDate) -> Option<DateRange> {
    match (query.from, query.to) {
        (Some(from), Some(to)) => DateRange::new(from, to),
        (None, None) => Some(DateRange::trailing(today, DEFAULT_WINDOW_DAYS)),
        (Some(from), None) => DateRange::new(from, today),
        (None, Some(_)) => None,
    }
}

async fn get_trends(
    State(state): State<SharedState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<TrendReport>, StatusCode> {
    let range = resolve_range(&query, Utc::now().date_naive()).ok_or(StatusCode::BAD_REQUEST)?;

    let (scope, default_language) = match query.scope {
        ScopeKind::Member => {
            let settings = state.org.member_settings(query.id).await.map_err(|e| {
                tracing::error!("Failed to load settings for member {}: {}", query.id, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            let settings = settings.ok_or(StatusCode::NOT_FOUND)?;
            (TrendScope::Member(query.id), settings.default_language)
        }
        ScopeKind::Organization => {
            let language = state.org.organization_language(query.id).await.map_err(|e| {
                tracing::error!("Failed to load organization {}: {}", query.id, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            let language = language.ok_or(StatusCode::NOT_FOUND)?;
            (TrendScope::Organization(query.id), language)
        }
    };
    let language = Language::resolve(query.locale.as_deref(), &default_language);

    let report = get_trend(state.store.as_ref(), &state.trend_cache, scope, range, language)
        .await
        .map_err(|e| {
            tracing::error!("Failed to build trend for {:?}: {}", scope, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{member_settings, MemoryStore, StaticOrgDirectory};
    use crate::web::test_support;
    use std::sync::Arc;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn query(from: Option<NaiveDate>, to: Option<NaiveDate>) -> TrendQuery {
        TrendQuery {
            scope: ScopeKind::Member,
            id: Uuid::new_v4(),
            from,
            to,
            locale: None,
        }
    }

    #[test]
    fn test_resolve_range() {
        let today = date(5, 31);
        let trailing = resolve_range(&query(None, None), today).unwrap();
        assert_eq!(trailing.from, date(5, 2));
        assert_eq!(trailing.to, today);

        assert!(resolve_range(&query(Some(date(5, 10)), Some(date(5, 1))), today).is_none());
        assert!(resolve_range(&query(None, Some(date(5, 1))), today).is_none());
        assert_eq!(
            resolve_range(&query(Some(date(5, 10)), None), today),
            DateRange::new(date(5, 10), today)
        );
    }

    #[tokio::test]
    async fn test_inverted_range_is_bad_request() {
        let member = Uuid::new_v4();
        let org = StaticOrgDirectory::default().with_member(member_settings(member, false));
        let state = test_support::state(Arc::new(MemoryStore::new()), org);
        let mut q = query(Some(date(2, 10)), Some(date(2, 1)));
        q.id = member;
        let result = get_trends(State(state), Query(q)).await;
        assert_eq!(result.unwrap_err(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_member_trend_uses_org_language() {
        let member = Uuid::new_v4();
        let org = StaticOrgDirectory::default().with_member(member_settings(member, false));
        let state = test_support::state(Arc::new(MemoryStore::new()), org);
        let mut q = query(Some(date(2, 1)), Some(date(2, 10)));
        q.id = member;
        let Json(report) = get_trends(State(state), Query(q)).await.unwrap();
        assert_eq!(report.locale, Language::Uk);
        assert_eq!(report.scope, TrendScope::Member(member));
        assert!(report.points.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_organization_is_not_found() {
        let state = test_support::state(Arc::new(MemoryStore::new()), StaticOrgDirectory::default());
        let q = TrendQuery {
            scope: ScopeKind::Organization,
            id: Uuid::new_v4(),
            from: None,
            to: None,
            locale: Some("en".to_string()),
        };
        let result = get_trends(State(state), Query(q)).await;
        assert_eq!(result.unwrap_err(), StatusCode::NOT_FOUND);
    }
}
