use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    Url,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;

use super::{
    ApproveRequest, EditEmailRequest, PipelineApi, StartRunRequest, TransportFailure,
    TransportResult, UploadFile,
};
use crate::{
    config::ClientConfig,
    types::{DocumentMeta, PipelineRunResponse},
};

// ── HTTP client builder ───────────────────────────────────────────────────────

pub fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);

    if let Some(proxy_url) = config.proxy.as_deref() {
        builder = builder.proxy(
            reqwest::Proxy::all(proxy_url)
                .with_context(|| format!("invalid proxy url `{proxy_url}`"))?,
        );
    }
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(Into::into)
}

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpPipelineClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpPipelineClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid API base url `{base_url}`"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base url `{base_url}` cannot carry a path");
        }
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(build_http_client(config)?, &config.base_url)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl PipelineApi for HttpPipelineClient {
    async fn upload_jd(&self, file: UploadFile) -> TransportResult<DocumentMeta> {
        let form = Form::new().part("file", file_part(file));
        let resp = self
            .client
            .post(self.endpoint(&["upload", "jd"]))
            .multipart(form)
            .send()
            .await;
        decode_json(resp).await
    }

    async fn upload_resumes(&self, files: Vec<UploadFile>) -> TransportResult<Vec<DocumentMeta>> {
        let form = files
            .into_iter()
            .fold(Form::new(), |form, file| form.part("files", file_part(file)));
        let resp = self
            .client
            .post(self.endpoint(&["upload", "resumes"]))
            .multipart(form)
            .send()
            .await;
        decode_json(resp).await
    }

    async fn list_documents(&self) -> TransportResult<Vec<DocumentMeta>> {
        let resp = self.client.get(self.endpoint(&["documents"])).send().await;
        decode_json(resp).await
    }

    async fn start_run(&self, jd_id: &str, top_n: usize) -> TransportResult<PipelineRunResponse> {
        let resp = self
            .client
            .post(self.endpoint(&["pipeline", "start"]))
            .json(&StartRunRequest { jd_id, top_n })
            .send()
            .await;
        decode_json(resp).await
    }

    async fn get_run(&self, run_id: &str) -> TransportResult<PipelineRunResponse> {
        let resp = self
            .client
            .get(self.endpoint(&["pipeline", run_id]))
            .send()
            .await;
        decode_json(resp).await
    }

    async fn approve(
        &self,
        run_id: &str,
        approved_resume_ids: &[String],
    ) -> TransportResult<PipelineRunResponse> {
        let resp = self
            .client
            .post(self.endpoint(&["pipeline", run_id, "approve"]))
            .json(&ApproveRequest {
                approved_resume_ids,
            })
            .send()
            .await;
        decode_json(resp).await
    }

    async fn edit_email(
        &self,
        run_id: &str,
        resume_id: &str,
        subject: &str,
        body: &str,
    ) -> TransportResult<PipelineRunResponse> {
        let resp = self
            .client
            .put(self.endpoint(&["pipeline", run_id, "emails", resume_id]))
            .json(&EditEmailRequest { subject, body })
            .send()
            .await;
        decode_json(resp).await
    }

    async fn reset_session(&self) -> TransportResult<()> {
        let resp = self
            .client
            .post(self.endpoint(&["session", "reset"]))
            .send()
            .await;
        ensure_success(resp).await.map(|_| ())
    }
}

fn file_part(file: UploadFile) -> Part {
    Part::bytes(file.bytes).file_name(file.filename)
}

// ── Response handling ─────────────────────────────────────────────────────────

async fn ensure_success(
    resp: std::result::Result<reqwest::Response, reqwest::Error>,
) -> TransportResult<reqwest::Response> {
    let resp = resp.map_err(|e| TransportFailure::network(format!("HTTP request failed: {e}")))?;
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(TransportFailure::http(status, text));
    }
    Ok(resp)
}

async fn decode_json<T: DeserializeOwned>(
    resp: std::result::Result<reqwest::Response, reqwest::Error>,
) -> TransportResult<T> {
    let resp = ensure_success(resp).await?;
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| TransportFailure::network(format!("failed reading response body: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TransportFailure::network(format!("failed to parse API response: {e}")))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::types::PipelineStatus;

    fn client_for(server: &MockServer) -> HttpPipelineClient {
        HttpPipelineClient::new(reqwest::Client::new(), &server.url("/api")).expect("client")
    }

    fn snapshot_json(run_id: &str, status: &str) -> serde_json::Value {
        json!({
            "run_id": run_id,
            "status": status,
            "jd_analysis": null,
            "evaluations": [],
            "emails": [],
            "error": null
        })
    }

    #[tokio::test]
    async fn start_run_posts_jd_id_and_top_n() {
        let server = MockServer::start_async().await;
        let start = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/pipeline/start")
                    .json_body(json!({ "jd_id": "jd-1", "top_n": 3 }));
                then.status(200).json_body(snapshot_json("run-1", "pending"));
            })
            .await;

        let snap = client_for(&server).start_run("jd-1", 3).await.expect("start");
        start.assert_async().await;
        assert_eq!(snap.run_id, "run-1");
        assert_eq!(snap.status, PipelineStatus::Pending);
    }

    #[tokio::test]
    async fn get_run_uses_run_id_path() {
        let server = MockServer::start_async().await;
        let get = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/pipeline/run-42");
                then.status(200)
                    .json_body(snapshot_json("run-42", "awaiting_approval"));
            })
            .await;

        let snap = client_for(&server).get_run("run-42").await.expect("get");
        get.assert_async().await;
        assert_eq!(snap.status, PipelineStatus::AwaitingApproval);
    }

    #[tokio::test]
    async fn approve_sends_selected_ids() {
        let server = MockServer::start_async().await;
        let approve = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/pipeline/run-1/approve")
                    .json_body(json!({ "approved_resume_ids": ["r1", "r2"] }));
                then.status(200)
                    .json_body(snapshot_json("run-1", "writing_emails"));
            })
            .await;

        let ids = vec!["r1".to_string(), "r2".to_string()];
        let snap = client_for(&server)
            .approve("run-1", &ids)
            .await
            .expect("approve");
        approve.assert_async().await;
        assert_eq!(snap.status, PipelineStatus::WritingEmails);
    }

    #[tokio::test]
    async fn edit_email_puts_subject_and_body() {
        let server = MockServer::start_async().await;
        let edit = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/api/pipeline/run-1/emails/r7")
                    .json_body(json!({ "subject": "Hello", "body": "Hi there" }));
                then.status(200).json_body(json!({
                    "run_id": "run-1",
                    "status": "completed",
                    "emails": [
                        { "resume_id": "r7", "candidate_name": "Ada", "subject": "Hello", "body": "Hi there" }
                    ]
                }));
            })
            .await;

        let snap = client_for(&server)
            .edit_email("run-1", "r7", "Hello", "Hi there")
            .await
            .expect("edit");
        edit.assert_async().await;
        assert_eq!(snap.emails.len(), 1);
        assert_eq!(snap.emails[0].subject, "Hello");
    }

    #[tokio::test]
    async fn non_success_maps_to_status_and_raw_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/pipeline/missing");
                then.status(404)
                    .body(r#"{"detail":"Pipeline run not found"}"#);
            })
            .await;

        let err = client_for(&server)
            .get_run("missing")
            .await
            .expect_err("404 should fail");
        assert_eq!(err.status, Some(404));
        assert_eq!(err.message, r#"{"detail":"Pipeline run not found"}"#);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_failure_without_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/documents");
                then.status(200).body("not json");
            })
            .await;

        let err = client_for(&server)
            .list_documents()
            .await
            .expect_err("garbage should fail");
        assert_eq!(err.status, None);
        assert!(err.message.contains("failed to parse API response"));
    }

    #[tokio::test]
    async fn uploads_are_multipart_posts() {
        let server = MockServer::start_async().await;
        let jd = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/upload/jd");
                then.status(200).json_body(json!({
                    "id": "jd-1", "filename": "role.txt", "doc_type": "jd",
                    "text": "Senior Rust engineer", "uploaded_at": "2026-03-01T09:30:00"
                }));
            })
            .await;
        let resumes = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/upload/resumes");
                then.status(200).json_body(json!([
                    { "id": "r1", "filename": "a.pdf", "doc_type": "resume", "text": "", "uploaded_at": "2026-03-01T09:31:00" },
                    { "id": "r2", "filename": "b.pdf", "doc_type": "resume", "text": "", "uploaded_at": "2026-03-01T09:31:00" }
                ]));
            })
            .await;

        let client = client_for(&server);
        let doc = client
            .upload_jd(UploadFile {
                filename: "role.txt".to_string(),
                bytes: b"Senior Rust engineer".to_vec(),
            })
            .await
            .expect("jd upload");
        let docs = client
            .upload_resumes(vec![
                UploadFile {
                    filename: "a.pdf".to_string(),
                    bytes: vec![1, 2, 3],
                },
                UploadFile {
                    filename: "b.pdf".to_string(),
                    bytes: vec![4, 5, 6],
                },
            ])
            .await
            .expect("resume upload");

        jd.assert_async().await;
        resumes.assert_async().await;
        assert_eq!(doc.id, "jd-1");
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn reset_session_ignores_response_body() {
        let server = MockServer::start_async().await;
        let reset = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/session/reset");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;

        client_for(&server).reset_session().await.expect("reset");
        reset.assert_async().await;
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_in_base() {
        let client =
            HttpPipelineClient::new(reqwest::Client::new(), "http://localhost:8000/api/")
                .expect("client");
        assert_eq!(
            client.endpoint(&["pipeline", "run-1", "approve"]).as_str(),
            "http://localhost:8000/api/pipeline/run-1/approve"
        );
    }
}
