pub mod http;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::types::{DocumentMeta, PipelineRunResponse};

pub use http::HttpPipelineClient;

// ── Failure ───────────────────────────────────────────────────────────────────

/// The only error the transport produces: a non-success response (with its
/// status and raw body) or a request that never got a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API {}: {message}", status_label(.status))]
pub struct TransportFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportFailure {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: body.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "unreachable".to_string(),
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportFailure>;

// ── Request payloads ──────────────────────────────────────────────────────────

/// A file handed to the ingestion endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartRunRequest<'a> {
    pub jd_id: &'a str,
    pub top_n: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApproveRequest<'a> {
    pub approved_resume_ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct EditEmailRequest<'a> {
    pub subject: &'a str,
    pub body: &'a str,
}

// ── Backend contract ──────────────────────────────────────────────────────────

/// One method per backend capability. Every call is a single exchange; none
/// retries on its own.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    async fn upload_jd(&self, file: UploadFile) -> TransportResult<DocumentMeta>;

    async fn upload_resumes(&self, files: Vec<UploadFile>) -> TransportResult<Vec<DocumentMeta>>;

    async fn list_documents(&self) -> TransportResult<Vec<DocumentMeta>>;

    async fn start_run(&self, jd_id: &str, top_n: usize) -> TransportResult<PipelineRunResponse>;

    async fn get_run(&self, run_id: &str) -> TransportResult<PipelineRunResponse>;

    async fn approve(
        &self,
        run_id: &str,
        approved_resume_ids: &[String],
    ) -> TransportResult<PipelineRunResponse>;

    async fn edit_email(
        &self,
        run_id: &str,
        resume_id: &str,
        subject: &str,
        body: &str,
    ) -> TransportResult<PipelineRunResponse>;

    async fn reset_session(&self) -> TransportResult<()>;
}
