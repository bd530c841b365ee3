use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::job::JobPosting;
use crate::store::StoreError;

/// Read side of the job store.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn open_jobs(&self) -> Result<Vec<JobPosting>, StoreError>;

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobPosting>, StoreError>;
}

#[derive(Clone)]
pub struct PgJobSource {
    pool: PgPool,
}

impl PgJobSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobSource for PgJobSource {
    async fn open_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            r#"
            SELECT id, employer_id, title, description, required_skills, status
            FROM jobs
            WHERE status = 'open'
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobPosting>, StoreError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            r#"
            SELECT id, employer_id, title, description, required_skills, status
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
