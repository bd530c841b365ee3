// Candidate/job matching.
// Scorers are pure or delegate to llm_client; the runner owns retry, fallback
// and persistence.

pub mod handlers;
pub mod prompts;
pub mod runner;
pub mod scorer;
pub mod skills;
