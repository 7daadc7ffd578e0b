use similar::{ChangeTag, TextDiff};

use crate::types::OutreachEmail;

/// A local working copy of one outreach email. Nothing is sent until the
/// controller saves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    resume_id: String,
    candidate_name: String,
    original_subject: String,
    original_body: String,
    subject: String,
    body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    Same,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub text: String,
}

impl EmailDraft {
    pub fn open(email: &OutreachEmail) -> Self {
        Self {
            resume_id: email.resume_id.clone(),
            candidate_name: email.candidate_name.clone(),
            original_subject: email.subject.clone(),
            original_body: email.body.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
        }
    }

    pub fn resume_id(&self) -> &str {
        &self.resume_id
    }

    pub fn candidate_name(&self) -> &str {
        &self.candidate_name
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.subject != self.original_subject || self.body != self.original_body
    }

    /// Line diff of the draft against what the backend last returned.
    pub fn diff(&self) -> Vec<DiffLine> {
        let before = render(&self.original_subject, &self.original_body);
        let after = render(&self.subject, &self.body);
        TextDiff::from_lines(&before, &after)
            .iter_all_changes()
            .map(|change| DiffLine {
                kind: match change.tag() {
                    ChangeTag::Equal => DiffLineKind::Same,
                    ChangeTag::Insert => DiffLineKind::Added,
                    ChangeTag::Delete => DiffLineKind::Removed,
                },
                text: change.value().trim_end_matches('\n').to_string(),
            })
            .collect()
    }
}

fn render(subject: &str, body: &str) -> String {
    let mut out = format!("Subject: {subject}\n\n{body}");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
