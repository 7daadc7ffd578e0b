use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

// ── Pipeline status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Pending,
    Researching,
    Evaluating,
    AwaitingApproval,
    WritingEmails,
    Completed,
    Failed,
}

/// Statuses for which the poller keeps fetching.
pub const ACTIVE_STATUSES: [PipelineStatus; 4] = [
    PipelineStatus::Pending,
    PipelineStatus::Researching,
    PipelineStatus::Evaluating,
    PipelineStatus::WritingEmails,
];

impl PipelineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Researching => "researching",
            Self::Evaluating => "evaluating",
            Self::AwaitingApproval => "awaiting_approval",
            Self::WritingEmails => "writing_emails",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Researching => "Researcher agent working…",
            Self::Evaluating => "Evaluator agent scoring…",
            Self::AwaitingApproval => "Awaiting your approval",
            Self::WritingEmails => "Writer agent drafting emails…",
            Self::Completed => "Pipeline complete",
            Self::Failed => "Pipeline failed",
        }
    }

    pub fn is_active(self) -> bool {
        ACTIVE_STATUSES.contains(&self)
    }

    /// Polling halts here until a human decision arrives.
    pub fn is_paused(self) -> bool {
        self == Self::AwaitingApproval
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn accepts_approval(self) -> bool {
        self.is_paused()
    }
}

// ── Documents ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Jd,
    Resume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: String,
    pub filename: String,
    pub doc_type: DocType,
    #[serde(default)]
    pub text: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub uploaded_at: NaiveDateTime,
}

/// Accepts both naive ISO timestamps and RFC 3339 timestamps with an offset.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(serde::de::Error::custom)
}

// ── Researcher / evaluator / writer output ────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JdAnalysis {
    pub role_title: String,
    pub technical_requirements: Vec<String>,
    pub soft_skills: Vec<String>,
    pub cultural_fit_indicators: Vec<String>,
    pub experience_level: String,
    pub education_requirements: Vec<String>,
    pub nice_to_haves: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// Drafted by a language model upstream, so casing drifts; anything unknown reads as low.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapItem {
    pub skill: String,
    #[serde(default = "default_trainable")]
    pub trainable: bool,
    #[serde(default)]
    pub severity: Severity,
}

fn default_trainable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub resume_id: String,
    #[serde(default = "default_candidate_name")]
    pub candidate_name: String,
    #[serde(default)]
    pub match_percentage: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gap_analysis: Vec<GapItem>,
    #[serde(default)]
    pub notable_projects: Vec<String>,
    #[serde(default)]
    pub shortlisted: bool,
}

fn default_candidate_name() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachEmail {
    pub resume_id: String,
    pub candidate_name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

// ── Run snapshot ──────────────────────────────────────────────────────────────

/// The unit of synchronization: always replaced whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunResponse {
    pub run_id: String,
    pub status: PipelineStatus,
    #[serde(default)]
    pub jd_analysis: Option<JdAnalysis>,
    #[serde(default)]
    pub evaluations: Vec<CandidateEvaluation>,
    #[serde(default)]
    pub emails: Vec<OutreachEmail>,
    #[serde(default)]
    pub error: Option<String>,
}
