// Prompt for the delegated scorer and the parser for its reply.

use lazy_static::lazy_static;
use regex::Regex;

use crate::matching::scorer::MatchRequest;

/// Builds the scoring prompt for one (candidate, job) pair.
pub fn build_match_prompt(request: &MatchRequest) -> String {
    format!(
        "Rate how well this candidate fits the job below.\n\
         \n\
         JOB TITLE: {title}\n\
         JOB DESCRIPTION:\n{description}\n\
         REQUIRED SKILLS: {required}\n\
         \n\
         CANDIDATE SKILLS: {candidate}\n\
         \n\
         Scoring rubric:\n\
         - 0-20: very poor match\n\
         - 21-40: poor match\n\
         - 41-60: fair match\n\
         - 61-80: good match\n\
         - 81-100: excellent match\n\
         \n\
         Respond with only the numeric score between 0 and 100.",
        title = request.job_title,
        description = request.job_description,
        required = join_or_none(&request.job_required_skills),
        candidate = join_or_none(&request.candidate_skills),
    )
}

fn join_or_none(skills: &[String]) -> String {
    if skills.is_empty() {
        "(none listed)".to_string()
    } else {
        skills.join(", ")
    }
}

lazy_static! {
    // First standalone integer in 0..=100. `\b` is Unicode-aware.
    static ref SCORE_RE: Regex = Regex::new(r"\b(100|[0-9]{1,2})\b").unwrap();
}

/// Returns the first standalone integer in 0..=100 found in a model reply.
pub fn extract_score(reply: &str) -> Option<u8> {
    SCORE_RE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
