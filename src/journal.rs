use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::json;

use crate::types::PipelineStatus;

const DETAIL_LIMIT_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalEvent {
    Launched,
    StatusChanged,
    Approved,
    EmailEdited,
    PollFailed,
    SessionReset,
}

impl JournalEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Launched => "launched",
            Self::StatusChanged => "status_changed",
            Self::Approved => "approved",
            Self::EmailEdited => "email_edited",
            Self::PollFailed => "poll_failed",
            Self::SessionReset => "session_reset",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JournalRecord<'a> {
    pub event: JournalEvent,
    pub run_id: Option<&'a str>,
    pub status: Option<PipelineStatus>,
    pub detail: Option<&'a str>,
}

impl<'a> JournalRecord<'a> {
    pub fn new(event: JournalEvent) -> Self {
        Self {
            event,
            run_id: None,
            status: None,
            detail: None,
        }
    }

    pub fn run(mut self, run_id: &'a str) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn status(mut self, status: PipelineStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn detail(mut self, detail: &'a str) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Append-only JSONL record of what happened to each run in this session.
#[derive(Debug, Clone)]
pub struct RunJournal {
    path: PathBuf,
    session: String,
}

impl RunJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let session = format!("session-{}", Local::now().format("%Y%m%d-%H%M%S"));
        Self {
            path: path.into(),
            session,
        }
    }

    pub fn write(&self, rec: JournalRecord<'_>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open `{}`", self.path.display()))?;

        let line = json!({
            "ts": Local::now().to_rfc3339(),
            "session": self.session,
            "event": rec.event.as_str(),
            "run_id": rec.run_id,
            "status": rec.status.map(|s| s.as_str()),
            "detail": rec.detail.map(|d| truncate_chars(d, DETAIL_LIMIT_CHARS)),
        });

        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Journal failures are reported and swallowed; they never fail the operation being recorded.
    pub fn record(&self, rec: JournalRecord<'_>) {
        if let Err(e) = self.write(rec) {
            tracing::warn!(path = %self.path.display(), "journal write failed: {e:#}");
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    const SUFFIX: &str = "…(truncated)";
    let suffix_len = SUFFIX.chars().count();
    if max <= suffix_len + 2 {
        return SUFFIX.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - suffix_len).collect();
    out.push_str(SUFFIX);
    out
}
