//! Read-only projections over a run snapshot. Nothing here is stored.

use std::collections::HashMap;

use crate::types::{CandidateEvaluation, OutreachEmail, PipelineRunResponse};

pub fn shortlisted_count(evaluations: &[CandidateEvaluation]) -> usize {
    evaluations.iter().filter(|e| e.shortlisted).count()
}

/// Rounded mean match percentage; 0 when nothing has been evaluated.
pub fn average_match(evaluations: &[CandidateEvaluation]) -> u32 {
    if evaluations.is_empty() {
        return 0;
    }
    let total: f64 = evaluations.iter().map(|e| e.match_percentage).sum();
    let mean = total / evaluations.len() as f64;
    mean.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Email per resume id. With duplicate ids the later entry wins.
pub fn email_lookup(emails: &[OutreachEmail]) -> HashMap<&str, &OutreachEmail> {
    emails.iter().map(|e| (e.resume_id.as_str(), e)).collect()
}

/// Highest match first; ties keep backend order.
pub fn ranked(evaluations: &[CandidateEvaluation]) -> Vec<&CandidateEvaluation> {
    let mut out: Vec<&CandidateEvaluation> = evaluations.iter().collect();
    out.sort_by(|a, b| {
        b.match_percentage
            .partial_cmp(&a.match_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub evaluated: usize,
    pub shortlisted: usize,
    pub average_match: u32,
    pub emails: usize,
}

impl RunSummary {
    pub fn of(snapshot: &PipelineRunResponse) -> Self {
        Self {
            evaluated: snapshot.evaluations.len(),
            shortlisted: shortlisted_count(&snapshot.evaluations),
            average_match: average_match(&snapshot.evaluations),
            emails: snapshot.emails.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unique(String),
    Ambiguous(Vec<String>),
    Missing,
}

/// Expands a typed prefix to a resume id known to the snapshot. An exact id
/// always wins over prefix matches.
pub fn resolve_resume_id(snapshot: &PipelineRunResponse, prefix: &str) -> Resolution {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Resolution::Missing;
    }
    let known = snapshot
        .evaluations
        .iter()
        .map(|e| e.resume_id.as_str())
        .chain(snapshot.emails.iter().map(|e| e.resume_id.as_str()));

    let mut hits: Vec<String> = Vec::new();
    for id in known {
        if id == prefix {
            return Resolution::Unique(id.to_string());
        }
        if id.starts_with(prefix) && !hits.iter().any(|h| h == id) {
            hits.push(id.to_string());
        }
    }
    match hits.len() {
        0 => Resolution::Missing,
        1 => Resolution::Unique(hits.remove(0)),
        _ => {
            hits.sort();
            Resolution::Ambiguous(hits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{email, evaluation, snapshot};
    use crate::types::PipelineStatus;

    #[test]
    fn average_of_three_scores() {
        let evals = vec![
            evaluation("a", 90.0, true),
            evaluation("b", 70.0, false),
            evaluation("c", 50.0, true),
        ];
        assert_eq!(average_match(&evals), 70);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_match(&[]), 0);
    }

    #[test]
    fn average_rounds_to_nearest() {
        let evals = vec![evaluation("a", 81.0, true), evaluation("b", 82.0, true)];
        assert_eq!(average_match(&evals), 82);
        let evals = vec![evaluation("a", 80.2, true), evaluation("b", 80.2, true)];
        assert_eq!(average_match(&evals), 80);
    }

    #[test]
    fn shortlisted_counts_flags() {
        let evals = vec![
            evaluation("a", 10.0, true),
            evaluation("b", 20.0, false),
            evaluation("c", 30.0, true),
        ];
        assert_eq!(shortlisted_count(&evals), 2);
    }

    #[test]
    fn duplicate_email_ids_resolve_to_last() {
        let emails = vec![
            email("r1", "first", "x"),
            email("r2", "other", "y"),
            email("r1", "second", "z"),
        ];
        let lookup = email_lookup(&emails);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup["r1"].subject, "second");
    }

    #[test]
    fn ranked_is_descending_and_stable() {
        let evals = vec![
            evaluation("low", 40.0, false),
            evaluation("tie-a", 75.0, true),
            evaluation("top", 92.5, true),
            evaluation("tie-b", 75.0, true),
        ];
        let order: Vec<&str> = ranked(&evals).iter().map(|e| e.resume_id.as_str()).collect();
        assert_eq!(order, vec!["top", "tie-a", "tie-b", "low"]);
    }

    #[test]
    fn summary_counts_everything() {
        let mut snap = snapshot("run-1", PipelineStatus::Completed);
        snap.evaluations = vec![evaluation("a", 90.0, true), evaluation("b", 60.0, false)];
        snap.emails = vec![email("a", "Hi", "Body")];
        assert_eq!(
            RunSummary::of(&snap),
            RunSummary {
                evaluated: 2,
                shortlisted: 1,
                average_match: 75,
                emails: 1,
            }
        );
    }

    #[test]
    fn prefixes_resolve_only_when_unique() {
        let mut snap = snapshot("run-1", PipelineStatus::AwaitingApproval);
        snap.evaluations = vec![
            evaluation("3f2a9c", 80.0, true),
            evaluation("3f77b1", 70.0, true),
            evaluation("a1", 60.0, false),
            evaluation("a10", 50.0, false),
        ];
        assert_eq!(resolve_resume_id(&snap, "3f2"), Resolution::Unique("3f2a9c".into()));
        assert_eq!(
            resolve_resume_id(&snap, "3f"),
            Resolution::Ambiguous(vec!["3f2a9c".into(), "3f77b1".into()])
        );
        assert_eq!(resolve_resume_id(&snap, "a1"), Resolution::Unique("a1".into()));
        assert_eq!(resolve_resume_id(&snap, "zz"), Resolution::Missing);
        assert_eq!(resolve_resume_id(&snap, " "), Resolution::Missing);
    }

    #[test]
    fn email_only_ids_are_resolvable() {
        let mut snap = snapshot("run-1", PipelineStatus::Completed);
        snap.emails = vec![email("r7", "Hello", "Hi there")];
        assert_eq!(resolve_resume_id(&snap, "r"), Resolution::Unique("r7".into()));
    }
}
