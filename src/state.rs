use crate::analytics::cache::TrendCache;
use crate::db::SurveyStore;
use crate::services::org::OrgDirectory;
use crate::services::orchestrator::RunLifecycle;
use crate::services::trends::TrendReport;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SurveyStore>,
    pub org: Arc<dyn OrgDirectory>,
    pub lifecycle: RunLifecycle,
    pub trend_cache: TrendCache<TrendReport>,
}

pub type SharedState = Arc<AppState>;
