//! Scripted backend used by controller tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::{PipelineApi, TransportFailure, TransportResult, UploadFile};
use crate::types::{
    CandidateEvaluation, DocType, DocumentMeta, OutreachEmail, PipelineRunResponse, PipelineStatus,
};

pub(crate) fn snapshot(run_id: &str, status: PipelineStatus) -> PipelineRunResponse {
    PipelineRunResponse {
        run_id: run_id.to_string(),
        status,
        jd_analysis: None,
        evaluations: Vec::new(),
        emails: Vec::new(),
        error: None,
    }
}

pub(crate) fn evaluation(resume_id: &str, match_percentage: f64, shortlisted: bool) -> CandidateEvaluation {
    CandidateEvaluation {
        resume_id: resume_id.to_string(),
        candidate_name: format!("Candidate {resume_id}"),
        match_percentage,
        reasoning: String::new(),
        strengths: Vec::new(),
        gap_analysis: Vec::new(),
        notable_projects: Vec::new(),
        shortlisted,
    }
}

pub(crate) fn email(resume_id: &str, subject: &str, body: &str) -> OutreachEmail {
    OutreachEmail {
        resume_id: resume_id.to_string(),
        candidate_name: format!("Candidate {resume_id}"),
        subject: subject.to_string(),
        body: body.to_string(),
    }
}

pub(crate) fn document(id: &str, doc_type: DocType) -> DocumentMeta {
    DocumentMeta {
        id: id.to_string(),
        filename: format!("{id}.pdf"),
        doc_type,
        text: String::new(),
        uploaded_at: NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap_or_default(),
    }
}

pub(crate) fn upload(name: &str) -> UploadFile {
    UploadFile {
        filename: name.to_string(),
        bytes: b"%PDF-1.4".to_vec(),
    }
}

/// Each run-returning method pops its own queue; once a queue runs dry the
/// last served entry repeats, so a poller can keep reading the same status.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    runs: Mutex<HashMap<&'static str, VecDeque<TransportResult<PipelineRunResponse>>>>,
    last: Mutex<HashMap<&'static str, TransportResult<PipelineRunResponse>>>,
    calls: Mutex<Vec<String>>,
    get_delay: Mutex<Option<Duration>>,
    documents: Mutex<Vec<DocumentMeta>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, method: &'static str, result: TransportResult<PipelineRunResponse>) {
        self.runs
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(result);
    }

    pub fn push_run(&self, method: &'static str, snapshot: PipelineRunResponse) {
        self.push(method, Ok(snapshot));
    }

    pub fn delay_get_run(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_documents(&self, docs: Vec<DocumentMeta>) {
        *self.documents.lock().unwrap() = docs;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(':').next() == Some(method))
            .count()
    }

    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    fn next(&self, method: &'static str) -> TransportResult<PipelineRunResponse> {
        let popped = self
            .runs
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        let mut last = self.last.lock().unwrap();
        match popped {
            Some(result) => {
                last.insert(method, result.clone());
                result
            }
            None => last.get(method).cloned().unwrap_or_else(|| {
                Err(TransportFailure::network(format!("no scripted {method} response")))
            }),
        }
    }
}

#[async_trait]
impl PipelineApi for ScriptedApi {
    async fn upload_jd(&self, file: UploadFile) -> TransportResult<DocumentMeta> {
        self.log(format!("upload_jd:{}", file.filename));
        Ok(document("jd-1", DocType::Jd))
    }

    async fn upload_resumes(&self, files: Vec<UploadFile>) -> TransportResult<Vec<DocumentMeta>> {
        self.log(format!("upload_resumes:{}", files.len()));
        Ok(files
            .iter()
            .enumerate()
            .map(|(i, _)| document(&format!("r{}", i + 1), DocType::Resume))
            .collect())
    }

    async fn list_documents(&self) -> TransportResult<Vec<DocumentMeta>> {
        self.log("list_documents".to_string());
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn start_run(&self, jd_id: &str, top_n: usize) -> TransportResult<PipelineRunResponse> {
        self.log(format!("start_run:{jd_id}:{top_n}"));
        self.next("start_run")
    }

    async fn get_run(&self, run_id: &str) -> TransportResult<PipelineRunResponse> {
        self.log(format!("get_run:{run_id}"));
        let delay = *self.get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.next("get_run")
    }

    async fn approve(
        &self,
        run_id: &str,
        approved_resume_ids: &[String],
    ) -> TransportResult<PipelineRunResponse> {
        self.log(format!("approve:{run_id}:{}", approved_resume_ids.join(",")));
        self.next("approve")
    }

    async fn edit_email(
        &self,
        run_id: &str,
        resume_id: &str,
        subject: &str,
        body: &str,
    ) -> TransportResult<PipelineRunResponse> {
        self.log(format!("edit_email:{run_id}:{resume_id}:{subject}:{body}"));
        self.next("edit_email")
    }

    async fn reset_session(&self) -> TransportResult<()> {
        self.log("reset_session".to_string());
        Ok(())
    }
}
