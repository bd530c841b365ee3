use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::match_record::{MatchRecord, MatchRow, MatchStatus};
use crate::store::StoreError;

/// Sole owner of `MatchRecord` persistence.
///
/// Implementations must keep at most one record per (student_id, job_id),
/// including under concurrent `upsert` calls on the same pair.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Inserts the pair, or overwrites score, status and `updated_at` if it exists.
    /// `created_at` survives updates.
    async fn upsert(
        &self,
        student_id: Uuid,
        job_id: Uuid,
        score: u8,
        status: MatchStatus,
    ) -> Result<MatchRecord, StoreError>;

    async fn find(&self, student_id: Uuid, job_id: Uuid)
        -> Result<Option<MatchRecord>, StoreError>;

    /// Records a review decision without touching the score.
    async fn set_status(
        &self,
        student_id: Uuid,
        job_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError>;

    /// Highest score first.
    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<MatchRecord>, StoreError>;

    /// Highest score first.
    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<MatchRecord>, StoreError>;

    /// Removes every match of a job. Returns the number removed.
    async fn delete_for_job(&self, job_id: Uuid) -> Result<u64, StoreError>;
}

/// Records a fresh score for a pair. A rescored match always re-enters the
/// review queue, whatever was decided about it before.
pub async fn upsert_match(
    store: &dyn MatchStore,
    student_id: Uuid,
    job_id: Uuid,
    score: u8,
) -> Result<MatchRecord, StoreError> {
    store
        .upsert(student_id, job_id, score.min(100), MatchStatus::Pending)
        .await
}

#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn upsert(
        &self,
        student_id: Uuid,
        job_id: Uuid,
        score: u8,
        status: MatchStatus,
    ) -> Result<MatchRecord, StoreError> {
        // Single statement: the primary key on (student_id, job_id) serializes
        // concurrent writers on one pair, last writer wins.
        let row = sqlx::query_as::<_, MatchRow>(
            r#"
            INSERT INTO matches (student_id, job_id, match_score, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, job_id) DO UPDATE
                SET match_score = EXCLUDED.match_score,
                    status      = EXCLUDED.status,
                    updated_at  = now()
            RETURNING student_id, job_id, match_score, status, created_at, updated_at
            "#,
        )
        .bind(student_id)
        .bind(job_id)
        .bind(i32::from(score))
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        MatchRecord::try_from(row)
    }

    async fn find(
        &self,
        student_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT student_id, job_id, match_score, status, created_at, updated_at
            FROM matches
            WHERE student_id = $1 AND job_id = $2
            "#,
        )
        .bind(student_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?
        .map(MatchRecord::try_from)
        .transpose()
    }

    async fn set_status(
        &self,
        student_id: Uuid,
        job_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            UPDATE matches
            SET status = $3, updated_at = now()
            WHERE student_id = $1 AND job_id = $2
            RETURNING student_id, job_id, match_score, status, created_at, updated_at
            "#,
        )
        .bind(student_id)
        .bind(job_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(MatchRecord::try_from)
        .transpose()
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<MatchRecord>, StoreError> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT student_id, job_id, match_score, status, created_at, updated_at
            FROM matches
            WHERE student_id = $1
            ORDER BY match_score DESC, updated_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(MatchRecord::try_from)
        .collect()
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<MatchRecord>, StoreError> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT student_id, job_id, match_score, status, created_at, updated_at
            FROM matches
            WHERE job_id = $1
            ORDER BY match_score DESC, updated_at DESC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(MatchRecord::try_from)
        .collect()
    }

    async fn delete_for_job(&self, job_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM matches WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        info!("Deleted {} matches for job {job_id}", result.rows_affected());
        Ok(result.rows_affected())
    }
}
