//! Storage seams. The matcher talks to three stores through traits so the
//! runner and handlers can be exercised against in-memory doubles; the
//! Postgres implementations live alongside each trait.

pub mod jobs;
pub mod matches;
pub mod resumes;

use thiserror::Error;

pub use jobs::{JobSource, PgJobSource};
pub use matches::{upsert_match, MatchStore, PgMatchStore};
pub use resumes::{PgResumeStore, ResumeStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}
