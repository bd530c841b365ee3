use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::matching::runner::ScoringPolicy;
use crate::matching::scorer::ScoringStrategy;

/// Default model for the delegated scorer.
pub const DEFAULT_LLM_MODEL: &str = "claude-sonnet-4-5";

/// Upper bound on `LLM_MAX_RETRIES`.
pub const MAX_LLM_RETRIES: u32 = 10;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub supabase_jwt_secret: String,
    pub anthropic_api_key: Option<String>,
    pub llm_model: String,
    pub scoring: ScoringPolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let strategy: ScoringStrategy = parse_env("SCORING_STRATEGY", ScoringStrategy::Lexical)?;
        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        if strategy == ScoringStrategy::Model && anthropic_api_key.is_none() {
            bail!("SCORING_STRATEGY=model requires ANTHROPIC_API_KEY to be set");
        }

        let concurrency: usize = parse_env("SCORING_CONCURRENCY", 4)?;
        if concurrency == 0 {
            bail!("SCORING_CONCURRENCY must be at least 1");
        }

        let max_retries = check_max_retries(parse_env("LLM_MAX_RETRIES", 2)?)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            supabase_jwt_secret: require_env("SUPABASE_JWT_SECRET")?,
            anthropic_api_key,
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            scoring: ScoringPolicy {
                strategy,
                fallback_to_lexical: parse_env("SCORING_FALLBACK", true)?,
                max_retries,
                concurrency,
            },
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn check_max_retries(max_retries: u32) -> Result<u32> {
    if max_retries > MAX_LLM_RETRIES {
        bail!("LLM_MAX_RETRIES must be at most {MAX_LLM_RETRIES}, got {max_retries}");
    }
    Ok(max_retries)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}
