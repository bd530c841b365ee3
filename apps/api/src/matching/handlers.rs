//! Axum route handlers for the Matching API.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::matching::runner::MatchRunSummary;
use crate::matching::scorer::{MatchRequest, ScoringStrategy};
use crate::matching::skills::skill_breakdown;
use crate::models::job::JobPosting;
use crate::models::match_record::{MatchRecord, MatchStatus};
use crate::state::AppState;

/// Upper bound on labels per list accepted by the preview endpoint.
const MAX_SKILLS_PER_LIST: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScorePreviewRequest {
    #[serde(default)]
    pub candidate_skills: Option<Vec<String>>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScorePreviewResponse {
    pub score: u8,
    pub strategy: ScoringStrategy,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: MatchStatus,
}

#[derive(Debug, Serialize)]
pub struct DeleteMatchesResponse {
    pub job_id: Uuid,
    pub deleted: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/score
///
/// Scores two skill lists without persisting anything. The configured
/// strategy and fallback apply; the lexical breakdown is always returned.
pub async fn handle_score_preview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<ScorePreviewRequest>, JsonRejection>,
) -> Result<Json<ScorePreviewResponse>, AppError> {
    let Json(body) = payload?;
    let candidate_skills = body.candidate_skills.unwrap_or_default();
    let required_skills = body.required_skills.unwrap_or_default();

    if candidate_skills.len() > MAX_SKILLS_PER_LIST || required_skills.len() > MAX_SKILLS_PER_LIST {
        return Err(AppError::Validation(format!(
            "skill lists are limited to {MAX_SKILLS_PER_LIST} entries"
        )));
    }

    let breakdown = skill_breakdown(&candidate_skills, &required_skills);
    let request = MatchRequest {
        candidate_id: session.user_id,
        job_id: Uuid::nil(),
        job_title: body.job_title.unwrap_or_default(),
        job_description: body.job_description.unwrap_or_default(),
        candidate_skills,
        job_required_skills: required_skills,
    };
    let scored = state.runner.score(&request).await?;

    Ok(Json(ScorePreviewResponse {
        score: scored.score,
        strategy: scored.strategy,
        matched_skills: breakdown.matched_skills,
        missing_skills: breakdown.missing_skills,
    }))
}

/// POST /api/v1/student/matches/run
///
/// Scores the calling student against every open job.
pub async fn handle_run_student_matches(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<MatchRunSummary>, AppError> {
    let summary = state.runner.match_candidate(session.user_id).await?;
    Ok(Json(summary))
}

/// GET /api/v1/student/matches
pub async fn handle_list_student_matches(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<MatchRecord>>, AppError> {
    Ok(Json(state.matches.list_for_student(session.user_id).await?))
}

/// POST /api/v1/employer/jobs/:job_id/matches/run
///
/// Scores one of the employer's jobs against every candidate with a CV.
pub async fn handle_run_job_matches(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MatchRunSummary>, AppError> {
    let Path(job_id) = path?;
    let job = load_owned_job(&state, &session, job_id).await?;
    let summary = state.runner.match_job(&job).await?;
    Ok(Json(summary))
}

/// GET /api/v1/employer/jobs/:job_id/matches
pub async fn handle_list_job_matches(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<MatchRecord>>, AppError> {
    let Path(job_id) = path?;
    load_owned_job(&state, &session, job_id).await?;
    Ok(Json(state.matches.list_for_job(job_id).await?))
}

/// PATCH /api/v1/employer/jobs/:job_id/matches/:student_id
///
/// Records the employer's review decision. The score is left untouched.
pub async fn handle_update_match_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MatchRecord>, AppError> {
    let Path((job_id, student_id)) = path?;
    let Json(body) = payload?;
    load_owned_job(&state, &session, job_id).await?;

    let record = state
        .matches
        .set_status(student_id, job_id, body.status)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No match for student {student_id} on job {job_id}"))
        })?;

    Ok(Json(record))
}

/// POST /api/v1/admin/matches/rescore
///
/// Batch rescore of every candidate against every open job.
pub async fn handle_rescore_all(
    State(state): State<AppState>,
) -> Result<Json<MatchRunSummary>, AppError> {
    Ok(Json(state.runner.rescore_all().await?))
}

/// DELETE /api/v1/admin/jobs/:job_id/matches
///
/// Explicit removal of a job's matches, e.g. before a job change the
/// `matches.job_id` foreign key would otherwise block.
pub async fn handle_delete_job_matches(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteMatchesResponse>, AppError> {
    let Path(job_id) = path?;
    let deleted = state.matches.delete_for_job(job_id).await?;
    Ok(Json(DeleteMatchesResponse { job_id, deleted }))
}

/// Loads a job the caller may act on: their own, or any job for admins.
async fn load_owned_job(
    state: &AppState,
    session: &Session,
    job_id: Uuid,
) -> Result<JobPosting, AppError> {
    let job = state
        .jobs
        .find_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if job.employer_id != session.user_id && !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}
