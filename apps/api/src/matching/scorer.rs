//! Match scoring — pluggable, trait-based scorers for one (candidate, job) pair.
//!
//! `LexicalScorer` is pure and never fails. `ModelScorer` asks an external
//! text-generation service for the number and fails with
//! `ScoringError::ExternalService` when the call errors or the reply has no
//! usable integer. Choosing a fallback is the caller's job, not the scorer's.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::prompts::NUMERIC_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError, TextGenerator};
use crate::matching::prompts::{build_match_prompt, extract_score};
use crate::matching::skills::{lexical_score, SkillSet};

/// Everything a scorer needs about one pair. Built per invocation, never stored.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub job_description: String,
    pub candidate_skills: SkillSet,
    pub job_required_skills: SkillSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    Lexical,
    Model,
}

impl ScoringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Lexical => "lexical",
            ScoringStrategy::Model => "model",
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lexical" => Ok(ScoringStrategy::Lexical),
            "model" | "llm" => Ok(ScoringStrategy::Model),
            other => Err(format!("unknown scoring strategy '{other}'")),
        }
    }
}

/// Why the external service did not yield a score.
#[derive(Debug, Error)]
pub enum ExternalFailure {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("no score in model reply {0:?}")]
    Unparseable(String),
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("{strategy} scoring failed for candidate {candidate_id}, job {job_id}: {source}")]
    ExternalService {
        candidate_id: Uuid,
        job_id: Uuid,
        strategy: ScoringStrategy,
        #[source]
        source: ExternalFailure,
    },
}

impl ScoringError {
    fn external(request: &MatchRequest, source: impl Into<ExternalFailure>) -> Self {
        ScoringError::ExternalService {
            candidate_id: request.candidate_id,
            job_id: request.job_id,
            strategy: ScoringStrategy::Model,
            source: source.into(),
        }
    }

    /// Only transport-level failures are worth retrying; a reply without a
    /// number will not improve on a second attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScoringError::ExternalService {
                source: ExternalFailure::Llm(e),
                ..
            } => e.is_retryable(),
            ScoringError::ExternalService { .. } => false,
        }
    }
}

/// The scorer trait. Carried in the runner as `Arc<dyn MatchScorer>`.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    fn strategy(&self) -> ScoringStrategy;

    async fn score(&self, request: &MatchRequest) -> Result<u8, ScoringError>;
}

/// Deterministic substring-overlap scorer. No I/O.
pub struct LexicalScorer;

#[async_trait]
impl MatchScorer for LexicalScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Lexical
    }

    async fn score(&self, request: &MatchRequest) -> Result<u8, ScoringError> {
        Ok(lexical_score(
            &request.candidate_skills,
            &request.job_required_skills,
        ))
    }
}

/// Delegated scorer. Not reproducible across calls and not cached.
pub struct ModelScorer<G = LlmClient> {
    generator: G,
}

impl<G: TextGenerator> ModelScorer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: TextGenerator> MatchScorer for ModelScorer<G> {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Model
    }

    async fn score(&self, request: &MatchRequest) -> Result<u8, ScoringError> {
        score_via_model(&self.generator, request).await
    }
}

/// Asks the model for a 0–100 score and parses the first integer out of its reply.
pub async fn score_via_model(
    generator: &dyn TextGenerator,
    request: &MatchRequest,
) -> Result<u8, ScoringError> {
    let prompt = build_match_prompt(request);

    let reply = generator
        .generate(NUMERIC_ONLY_SYSTEM, &prompt)
        .await
        .map_err(|e| ScoringError::external(request, e))?;

    extract_score(&reply).ok_or_else(|| {
        ScoringError::external(request, ExternalFailure::Unparseable(truncate(&reply, 80)))
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{match_request, CannedGenerator};

    #[tokio::test]
    async fn test_lexical_scorer_matches_free_function() {
        let request = match_request(
            &["JavaScript", "React", "Node.js", "SQL"],
            &["JavaScript", "React", "Node.js", "Database Design"],
        );
        assert_eq!(LexicalScorer.score(&request).await.unwrap(), 75);
        assert_eq!(LexicalScorer.strategy(), ScoringStrategy::Lexical);
    }

    #[tokio::test]
    async fn test_model_scorer_parses_reply() {
        let scorer = ModelScorer::new(CannedGenerator::replying("Score: 82"));
        let request = match_request(&["Rust"], &["Rust", "Kafka"]);
        assert_eq!(scorer.score(&request).await.unwrap(), 82);
    }

    #[tokio::test]
    async fn test_model_scorer_sends_prompt_with_skills() {
        let generator = CannedGenerator::replying("50");
        let request = match_request(&["Figma"], &["UX Research"]);
        score_via_model(&generator, &request).await.unwrap();

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Figma"));
        assert!(prompts[0].contains("UX Research"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_external_service_error() {
        let scorer = ModelScorer::new(CannedGenerator::replying("Strong candidate overall."));
        let request = match_request(&["Go"], &["Go"]);

        let err = scorer.score(&request).await.unwrap_err();
        let ScoringError::ExternalService {
            candidate_id,
            job_id,
            strategy,
            source,
        } = &err;
        assert_eq!(*candidate_id, request.candidate_id);
        assert_eq!(*job_id, request.job_id);
        assert_eq!(*strategy, ScoringStrategy::Model);
        assert!(matches!(source, ExternalFailure::Unparseable(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_transport_failure_is_retryable_external_error() {
        let scorer = ModelScorer::new(CannedGenerator::failing(429));
        let request = match_request(&["Go"], &["Go"]);

        let err = scorer.score(&request).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("model scoring failed"));
    }

    #[test]
    fn test_strategy_parses_case_insensitively() {
        assert_eq!("LEXICAL".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Lexical));
        assert_eq!("llm".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Model));
        assert!("random".parse::<ScoringStrategy>().is_err());
    }
}
