use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Skills extracted from a candidate's most recent CV.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateSkills {
    pub student_id: Uuid,
    pub skills: Option<Vec<String>>,
}

impl CandidateSkills {
    pub fn skills(&self) -> &[String] {
        self.skills.as_deref().unwrap_or_default()
    }
}
