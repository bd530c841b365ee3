use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::StoreError;

/// Review state of a match. Every (re)score puts a match back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Reviewed => "reviewed",
            MatchStatus::Shortlisted => "shortlisted",
            MatchStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "reviewed" => Ok(MatchStatus::Reviewed),
            "shortlisted" => Ok(MatchStatus::Shortlisted),
            "rejected" => Ok(MatchStatus::Rejected),
            other => Err(format!("unknown match status '{other}'")),
        }
    }
}

/// Raw `matches` row.
#[derive(Debug, Clone, FromRow)]
pub struct MatchRow {
    pub student_id: Uuid,
    pub job_id: Uuid,
    pub match_score: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One scored (student, job) pair. At most one exists per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub student_id: Uuid,
    pub job_id: Uuid,
    pub match_score: u8,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MatchRow> for MatchRecord {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let match_score = u8::try_from(row.match_score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| {
                StoreError::CorruptRecord(format!(
                    "match ({}, {}) has score {}",
                    row.student_id, row.job_id, row.match_score
                ))
            })?;
        let status = row.status.parse().map_err(StoreError::CorruptRecord)?;

        Ok(MatchRecord {
            student_id: row.student_id,
            job_id: row.job_id,
            match_score,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
