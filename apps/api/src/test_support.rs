//! In-memory doubles and fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthError, IdentityProvider, Session};
use crate::llm_client::{LlmError, TextGenerator};
use crate::matching::scorer::MatchRequest;
use crate::matching::skills::SkillSet;
use crate::models::job::JobPosting;
use crate::models::match_record::{MatchRecord, MatchStatus};
use crate::models::resume::CandidateSkills;
use crate::store::{JobSource, MatchStore, ResumeStore, StoreError};

pub fn match_request(candidate: &[&str], required: &[&str]) -> MatchRequest {
    MatchRequest {
        candidate_id: Uuid::new_v4(),
        job_id: Uuid::new_v4(),
        job_title: "Software Engineer".to_string(),
        job_description: "Work on the campus careers platform.".to_string(),
        candidate_skills: candidate.iter().map(|s| s.to_string()).collect(),
        job_required_skills: required.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn job_posting(title: &str, required: &[&str]) -> JobPosting {
    JobPosting {
        id: Uuid::new_v4(),
        employer_id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{title} role"),
        required_skills: Some(required.iter().map(|s| s.to_string()).collect()),
        status: "open".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stores
// ────────────────────────────────────────────────────────────────────────────

/// Match store keyed by (student_id, job_id); the map key enforces uniqueness.
#[derive(Default)]
pub struct InMemoryMatchStore {
    records: Mutex<HashMap<(Uuid, Uuid), MatchRecord>>,
}

impl InMemoryMatchStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn sorted(mut records: Vec<MatchRecord>) -> Vec<MatchRecord> {
        records.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        records
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn upsert(
        &self,
        student_id: Uuid,
        job_id: Uuid,
        score: u8,
        status: MatchStatus,
    ) -> Result<MatchRecord, StoreError> {
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry((student_id, job_id))
            .and_modify(|r| {
                r.match_score = score;
                r.status = status;
                r.updated_at = now;
            })
            .or_insert_with(|| MatchRecord {
                student_id,
                job_id,
                match_score: score,
                status,
                created_at: now,
                updated_at: now,
            });
        Ok(record.clone())
    }

    async fn find(
        &self,
        student_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(student_id, job_id))
            .cloned())
    }

    async fn set_status(
        &self,
        student_id: Uuid,
        job_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let mut records = self.records.lock().unwrap();
        Ok(records.get_mut(&(student_id, job_id)).map(|r| {
            r.status = status;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<MatchRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(Self::sorted(
            records
                .values()
                .filter(|r| r.student_id == student_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<MatchRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(Self::sorted(
            records
                .values()
                .filter(|r| r.job_id == job_id)
                .cloned()
                .collect(),
        ))
    }

    async fn delete_for_job(&self, job_id: Uuid) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|(_, job), _| *job != job_id);
        Ok((before - records.len()) as u64)
    }
}

pub struct InMemoryJobs {
    jobs: Vec<JobPosting>,
}

impl InMemoryJobs {
    pub fn new(jobs: Vec<JobPosting>) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl JobSource for InMemoryJobs {
    async fn open_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        Ok(self
            .jobs
            .iter()
            .filter(|j| j.status == "open")
            .cloned()
            .collect())
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobPosting>, StoreError> {
        Ok(self.jobs.iter().find(|j| j.id == job_id).cloned())
    }
}

pub struct InMemoryResumes {
    candidates: Vec<CandidateSkills>,
}

impl InMemoryResumes {
    pub fn new(candidates: Vec<CandidateSkills>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl ResumeStore for InMemoryResumes {
    async fn candidate_skills(&self, student_id: Uuid) -> Result<Option<SkillSet>, StoreError> {
        Ok(self
            .candidates
            .iter()
            .find(|c| c.student_id == student_id)
            .map(|c| c.skills().to_vec()))
    }

    async fn all_candidate_skills(&self) -> Result<Vec<CandidateSkills>, StoreError> {
        Ok(self.candidates.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// External services
// ────────────────────────────────────────────────────────────────────────────

/// Text generator that fails `failures` times with `status`, then replies.
pub struct CannedGenerator {
    reply: String,
    failures: usize,
    status: u16,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self::failing_then(0, 500, reply)
    }

    pub fn failing(status: u16) -> Self {
        Self::failing_then(usize::MAX, status, "")
    }

    pub fn failing_then(failures: usize, status: u16, reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failures,
            status,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if call < self.failures {
            return Err(LlmError::Api {
                status: self.status,
                message: "canned failure".to_string(),
            });
        }
        Ok(self.reply.clone())
    }
}

/// Text generator that sleeps before replying and records how many calls
/// were in flight at once.
pub struct SlowGenerator {
    delay: Duration,
    reply: String,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowGenerator {
    pub fn new(delay: Duration, reply: &str) -> Self {
        Self {
            delay,
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Fixed token → session table.
pub struct StaticIdentityProvider {
    sessions: HashMap<String, Session>,
}

impl StaticIdentityProvider {
    pub fn new(sessions: Vec<(&str, Session)>) -> Self {
        Self {
            sessions: sessions
                .into_iter()
                .map(|(token, session)| (token.to_string(), session))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<Session, AuthError> {
        self.sessions
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown test token".to_string()))
    }
}
