//! Match Runner — pairs candidates with jobs, scores each pair and persists it.
//!
//! Flow: load skills / jobs → build one `MatchRequest` per pair → score on a
//! bounded pool of tokio tasks → `upsert_match` → collect a `MatchRunSummary`.
//!
//! Policies that belong to the caller rather than the scorer live here:
//! the concurrency bound (which rate-limits the external model), retry with
//! exponential backoff on transport failures, and lexical fallback.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::matching::scorer::{MatchRequest, MatchScorer, ScoringError, ScoringStrategy};
use crate::matching::skills::{lexical_score, SkillSet};
use crate::models::job::JobPosting;
use crate::models::resume::CandidateSkills;
use crate::store::{upsert_match, JobSource, MatchStore, ResumeStore, StoreError};

/// Base delay of the retry backoff: 1s, 2s, 4s, ...
const RETRY_BASE_DELAY_MS: u64 = 1000;
/// Longest single wait between retries.
const MAX_RETRY_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    pub strategy: ScoringStrategy,
    /// Use the lexical score when the model strategy fails.
    pub fallback_to_lexical: bool,
    /// Extra attempts after a retryable model failure.
    pub max_retries: u32,
    /// Upper bound on pairs scored at once.
    pub concurrency: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::Lexical,
            fallback_to_lexical: true,
            max_retries: 2,
            concurrency: 4,
        }
    }
}

/// A score together with the strategy that actually produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scored {
    pub score: u8,
    pub strategy: ScoringStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredMatch {
    pub student_id: Uuid,
    pub job_id: Uuid,
    pub match_score: u8,
    pub strategy: ScoringStrategy,
}

/// One pair that could not be scored or saved. Carries enough context to log
/// and decide on a rerun.
#[derive(Debug, Clone, Serialize)]
pub struct MatchFailure {
    pub student_id: Uuid,
    pub job_id: Uuid,
    pub strategy: ScoringStrategy,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchRunSummary {
    pub scored: Vec<ScoredMatch>,
    pub failures: Vec<MatchFailure>,
}

#[derive(Clone)]
pub struct MatchRunner {
    scorer: Arc<dyn MatchScorer>,
    matches: Arc<dyn MatchStore>,
    jobs: Arc<dyn JobSource>,
    resumes: Arc<dyn ResumeStore>,
    policy: ScoringPolicy,
}

impl MatchRunner {
    pub fn new(
        scorer: Arc<dyn MatchScorer>,
        matches: Arc<dyn MatchStore>,
        jobs: Arc<dyn JobSource>,
        resumes: Arc<dyn ResumeStore>,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            scorer,
            matches,
            jobs,
            resumes,
            policy,
        }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.scorer.strategy()
    }

    /// Scores one candidate against every open job.
    ///
    /// A candidate without a CV is scored with an empty skill set rather than
    /// rejected, so every job gets a 0 from the lexical scorer.
    pub async fn match_candidate(&self, candidate_id: Uuid) -> Result<MatchRunSummary, StoreError> {
        let skills = match self.resumes.candidate_skills(candidate_id).await? {
            Some(skills) => skills,
            None => {
                warn!("Candidate {candidate_id} has no CV; scoring with an empty skill set");
                SkillSet::new()
            }
        };
        let jobs = self.jobs.open_jobs().await?;

        let requests = jobs
            .iter()
            .map(|job| build_request(candidate_id, &skills, job))
            .collect();

        let summary = self.run(requests).await;
        info!(
            "Matched candidate {candidate_id}: {} scored, {} failed",
            summary.scored.len(),
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Scores one job against every candidate with a CV.
    pub async fn match_job(&self, job: &JobPosting) -> Result<MatchRunSummary, StoreError> {
        let candidates = self.resumes.all_candidate_skills().await?;

        let requests = candidates
            .iter()
            .map(|c| build_request(c.student_id, c.skills(), job))
            .collect();

        let summary = self.run(requests).await;
        info!(
            "Matched job {}: {} scored, {} failed",
            job.id,
            summary.scored.len(),
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Rescores every candidate against every open job.
    pub async fn rescore_all(&self) -> Result<MatchRunSummary, StoreError> {
        let candidates: Vec<CandidateSkills> = self.resumes.all_candidate_skills().await?;
        let jobs = self.jobs.open_jobs().await?;

        let requests = candidates
            .iter()
            .flat_map(|c| {
                jobs.iter()
                    .map(move |job| build_request(c.student_id, c.skills(), job))
            })
            .collect();

        let summary = self.run(requests).await;
        info!(
            "Rescored {} candidates x {} jobs: {} scored, {} failed",
            candidates.len(),
            jobs.len(),
            summary.scored.len(),
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Scores and persists every request, at most `policy.concurrency` at a time.
    /// Failures are collected per pair and never stop the rest of the run.
    pub async fn run(&self, requests: Vec<MatchRequest>) -> MatchRunSummary {
        let semaphore = Arc::new(Semaphore::new(self.policy.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for request in requests {
            let runner = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let (student_id, job_id) = (request.candidate_id, request.job_id);
                let strategy = runner.strategy();
                // A panicking pair is reported like any other failure.
                tokio::spawn(async move { runner.score_and_persist(request).await })
                    .await
                    .unwrap_or_else(|e| {
                        error!("Match task for candidate {student_id}, job {job_id} aborted: {e}");
                        Err(MatchFailure {
                            student_id,
                            job_id,
                            strategy,
                            error: format!("task aborted: {e}"),
                        })
                    })
            });
        }

        let mut summary = MatchRunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(scored)) => summary.scored.push(scored),
                Ok(Err(failure)) => summary.failures.push(failure),
                Err(e) => error!("Match task aborted: {e}"),
            }
        }

        summary
            .scored
            .sort_by(|a, b| b.match_score.cmp(&a.match_score));
        summary
    }

    async fn score_and_persist(&self, request: MatchRequest) -> Result<ScoredMatch, MatchFailure> {
        let failure = |strategy: ScoringStrategy, error: String| MatchFailure {
            student_id: request.candidate_id,
            job_id: request.job_id,
            strategy,
            error,
        };

        let scored = self
            .score(&request)
            .await
            .map_err(|e| failure(self.strategy(), e.to_string()))?;

        let record = upsert_match(
            self.matches.as_ref(),
            request.candidate_id,
            request.job_id,
            scored.score,
        )
        .await
        .map_err(|e| {
            error!(
                "Failed to save match for candidate {}, job {}: {e}",
                request.candidate_id, request.job_id
            );
            failure(scored.strategy, e.to_string())
        })?;

        Ok(ScoredMatch {
            student_id: record.student_id,
            job_id: record.job_id,
            match_score: record.match_score,
            strategy: scored.strategy,
        })
    }

    /// Scores one pair with the configured strategy, applying retry and fallback.
    pub async fn score(&self, request: &MatchRequest) -> Result<Scored, ScoringError> {
        match self.score_with_retry(request).await {
            Ok(score) => Ok(Scored {
                score,
                strategy: self.strategy(),
            }),
            Err(e) if self.policy.fallback_to_lexical
                && self.strategy() != ScoringStrategy::Lexical =>
            {
                warn!("{e}; falling back to lexical scoring");
                Ok(Scored {
                    score: lexical_score(&request.candidate_skills, &request.job_required_skills),
                    strategy: ScoringStrategy::Lexical,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn score_with_retry(&self, request: &MatchRequest) -> Result<u8, ScoringError> {
        let mut attempt = 0;
        loop {
            match self.scorer.score(request).await {
                Ok(score) => return Ok(score.min(100)),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(attempt);
                    warn!(
                        "{e}; retry {attempt}/{} after {}ms",
                        self.policy.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential backoff for the given 1-based retry, capped at `MAX_RETRY_DELAY_MS`.
fn backoff_delay(attempt: u32) -> Duration {
    let millis = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .and_then(|factor| RETRY_BASE_DELAY_MS.checked_mul(factor))
        .map_or(MAX_RETRY_DELAY_MS, |ms| ms.min(MAX_RETRY_DELAY_MS));
    Duration::from_millis(millis)
}

fn build_request(candidate_id: Uuid, skills: &[String], job: &JobPosting) -> MatchRequest {
    MatchRequest {
        candidate_id,
        job_id: job.id,
        job_title: job.title.clone(),
        job_description: job.description.clone(),
        candidate_skills: skills.to_vec(),
        job_required_skills: job.required_skills().to_vec(),
    }
}
