use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting as the matcher sees it. `required_skills` is NULL when the
/// employer listed none.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    pub required_skills: Option<Vec<String>>,
    pub status: String,
}

impl JobPosting {
    pub fn required_skills(&self) -> &[String] {
        self.required_skills.as_deref().unwrap_or_default()
    }
}
