use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::matching::skills::SkillSet;
use crate::models::resume::CandidateSkills;
use crate::store::StoreError;

/// Read side of the resume store. A candidate's skills come from their most
/// recent CV, joined on `cvs.student_id`.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// `None` when the candidate has never uploaded a CV.
    async fn candidate_skills(&self, student_id: Uuid) -> Result<Option<SkillSet>, StoreError>;

    /// Latest skills of every candidate with at least one CV.
    async fn all_candidate_skills(&self) -> Result<Vec<CandidateSkills>, StoreError>;
}

#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn candidate_skills(&self, student_id: Uuid) -> Result<Option<SkillSet>, StoreError> {
        let latest: Option<CandidateSkills> = sqlx::query_as(
            r#"
            SELECT student_id, skills
            FROM cvs
            WHERE student_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(latest.map(|cv| cv.skills.unwrap_or_default()))
    }

    async fn all_candidate_skills(&self) -> Result<Vec<CandidateSkills>, StoreError> {
        Ok(sqlx::query_as::<_, CandidateSkills>(
            r#"
            SELECT DISTINCT ON (student_id) student_id, skills
            FROM cvs
            ORDER BY student_id, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
