//! Lexical skill overlap — the deterministic match heuristic.
//!
//! A required skill counts as covered when any candidate skill contains it, or
//! is contained by it, after lowercasing. Containment runs both ways so that
//! "java" covers "javascript" and vice versa. Short tokens over-match; that is
//! accepted.

use serde::Serialize;

/// Free-text skill labels. Case-insensitive, not deduplicated, not canonicalized.
pub type SkillSet = Vec<String>;

/// Score plus the split of required skills into covered and uncovered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillBreakdown {
    pub score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// Percentage of required skills covered by the candidate, rounded, in 0..=100.
///
/// No requirements → 0.
pub fn lexical_score(candidate_skills: &[String], required_skills: &[String]) -> u8 {
    skill_breakdown(candidate_skills, required_skills).score
}

/// Like [`lexical_score`] but also reports which required skills were covered.
///
/// Blank labels are skipped on both sides; an empty candidate label would
/// otherwise be a substring of every requirement.
pub fn skill_breakdown(candidate_skills: &[String], required_skills: &[String]) -> SkillBreakdown {
    let candidates: Vec<String> = candidate_skills
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_lowercase())
        .collect();

    let mut matched_skills = Vec::new();
    let mut missing_skills = Vec::new();

    for required in required_skills.iter().filter(|s| !s.trim().is_empty()) {
        let required_lower = required.to_lowercase();
        let covered = candidates.iter().any(|c| {
            required_lower.contains(c.as_str()) || c.contains(required_lower.as_str())
        });
        if covered {
            matched_skills.push(required.clone());
        } else {
            missing_skills.push(required.clone());
        }
    }

    let total = matched_skills.len() + missing_skills.len();
    let score = if total == 0 {
        0
    } else {
        let ratio = matched_skills.len() as f64 / total as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    };

    SkillBreakdown {
        score,
        matched_skills,
        missing_skills,
    }
}
