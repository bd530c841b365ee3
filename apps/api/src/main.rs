mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::SupabaseIdentityProvider;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::runner::MatchRunner;
use crate::matching::scorer::{LexicalScorer, MatchScorer, ModelScorer, ScoringStrategy};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{PgJobSource, PgMatchStore, PgResumeStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matchboard v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (hosted backend tables)
    let db = create_pool(&config.database_url).await?;

    let scorer = build_scorer(&config)?;
    info!(
        "Scoring strategy: {} (fallback to lexical: {}, concurrency: {}, retries: {})",
        scorer.strategy(),
        config.scoring.fallback_to_lexical,
        config.scoring.concurrency,
        config.scoring.max_retries
    );

    let matches = Arc::new(PgMatchStore::new(db.clone()));
    let jobs = Arc::new(PgJobSource::new(db.clone()));
    let resumes = Arc::new(PgResumeStore::new(db.clone()));

    let state = AppState {
        runner: MatchRunner::new(
            scorer,
            matches.clone(),
            jobs.clone(),
            resumes,
            config.scoring.clone(),
        ),
        matches,
        jobs,
        identity: Arc::new(SupabaseIdentityProvider::new(
            &config.supabase_jwt_secret,
            db,
        )),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the portal domains

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Picks the primary scorer for the configured strategy.
fn build_scorer(config: &Config) -> Result<Arc<dyn MatchScorer>> {
    match config.scoring.strategy {
        ScoringStrategy::Lexical => Ok(Arc::new(LexicalScorer)),
        ScoringStrategy::Model => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for model scoring")?;
            let llm = LlmClient::new(api_key, config.llm_model.clone())?;
            info!("LLM client initialized (model: {})", llm.model());
            Ok(Arc::new(ModelScorer::new(llm)))
        }
    }
}
