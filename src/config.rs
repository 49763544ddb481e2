use crate::services::generation::GeneratorSettings;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    /// No key means no AI capability; every member gets seed surveys.
    pub openai_api_key: Option<String>,
    pub generator: GeneratorSettings,
    pub trend_cache_ttl_secs: u64,
    pub bind_addr: String,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL missing")?;
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let defaults = GeneratorSettings::default();
        let generator = GeneratorSettings {
            primary_model: std::env::var("OPENAI_PRIMARY_MODEL").unwrap_or(defaults.primary_model),
            fallback_model: std::env::var("OPENAI_FALLBACK_MODEL")
                .unwrap_or(defaults.fallback_model),
            max_output_tokens: env_or("GENERATION_MAX_OUTPUT_TOKENS", defaults.max_output_tokens),
            timeout: Duration::from_secs(env_or(
                "GENERATION_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
            required_count: defaults.required_count,
        };

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
            let port = env_or("PORT", 3000u16);
            format!("0.0.0.0:{port}")
        });

        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            openai_api_key,
            generator,
            trend_cache_ttl_secs: env_or("TREND_CACHE_TTL_SECS", 60),
            bind_addr,
        })
    }
}
