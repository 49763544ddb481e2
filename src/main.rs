use axum::Router;
use pulse_core::analytics::cache::TrendCache;
use pulse_core::config::AppConfig;
use pulse_core::db::PgStore;
use pulse_core::services::generation::OpenAiGenerator;
use pulse_core::services::orchestrator::RunLifecycle;
use pulse_core::services::question_generator::QuestionGenerator;
use pulse_core::state::{AppState, SharedState};
use pulse_core::web;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;
    tracing::info!("Database migrations completed");

    let store = Arc::new(PgStore::new(pool));

    let generator = match &config.openai_api_key {
        Some(key) => {
            tracing::info!(
                "Adaptive generation enabled ({} / {})",
                config.generator.primary_model,
                config.generator.fallback_model
            );
            Some(Arc::new(QuestionGenerator::new(
                store.clone(),
                Arc::new(OpenAiGenerator::new(key.clone())),
                config.generator.clone(),
            )))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set; serving seed surveys only");
            None
        }
    };

    let shared: SharedState = Arc::new(AppState {
        store: store.clone(),
        org: store.clone(),
        lifecycle: RunLifecycle::new(store, generator),
        trend_cache: TrendCache::new(config.trend_cache_ttl_secs),
    });

    let scheduler = JobScheduler::new().await?;

    // Trend cache purge every 10 minutes
    let shared_for_cache = shared.clone();
    scheduler
        .add(Job::new_async("0 */10 * * * *", move |_uuid, _l| {
            let state = shared_for_cache.clone();
            Box::pin(async move {
                let purged = state.trend_cache.purge_expired().await;
                if purged > 0 {
                    tracing::info!("Purged {} expired trend cache entries", purged);
                }
            })
        })?)
        .await?;

    scheduler.start().await?;
    tracing::info!("Scheduler started: trend cache purge every 10 min");

    let app = Router::new()
        .merge(web::routes(shared))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
