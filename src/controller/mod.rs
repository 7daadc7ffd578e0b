pub mod editor;
pub mod poller;
pub mod selection;
pub mod session;
pub mod store;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::api::{PipelineApi, TransportFailure, UploadFile};
use crate::config::ClientConfig;
use crate::journal::{JournalEvent, JournalRecord, RunJournal};
use crate::types::{DocumentMeta, PipelineRunResponse, PipelineStatus};

pub use editor::EmailDraft;
pub use poller::PollScheduler;
pub use selection::SelectionSet;
pub use session::UploadSession;
pub use store::{ApplyOutcome, RunState, RunStore};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Transport(#[from] TransportFailure),
    #[error("select at least one candidate before approving")]
    EmptySelection,
    #[error("no pipeline run is active")]
    NoActiveRun,
    #[error("upload a job description first")]
    NoJobDescription,
    #[error("upload at least one resume first")]
    NoResumes,
    #[error("shortlist size must be at least 1 (got {0})")]
    InvalidShortlistSize(usize),
    #[error("cannot {action} while the run is {}", .status.as_str())]
    ActionNotAllowed {
        action: &'static str,
        status: PipelineStatus,
    },
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Owns everything the client knows about the current run: the snapshot store,
/// the poller that keeps it fresh, the approval selection and the upload session.
pub struct RunController {
    api: Arc<dyn PipelineApi>,
    store: RunStore,
    poller: PollScheduler,
    selection: SelectionSet,
    session: UploadSession,
    journal: Option<RunJournal>,
}

impl RunController {
    pub fn new(api: Arc<dyn PipelineApi>, config: &ClientConfig) -> Self {
        let journal = config.journal_path.as_ref().map(RunJournal::new);
        let store = RunStore::new();
        let poller = PollScheduler::new(Arc::clone(&api), store.clone(), config.poll_interval)
            .with_journal(journal.clone());
        Self {
            api,
            store,
            poller,
            selection: SelectionSet::new(),
            session: UploadSession::new(config.default_top_n),
            journal,
        }
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_armed()
    }

    fn note(&self, rec: JournalRecord<'_>) {
        if let Some(journal) = &self.journal {
            journal.record(rec);
        }
    }

    fn require_active_run(&self) -> Result<(String, PipelineStatus), ControllerError> {
        self.store.active().ok_or(ControllerError::NoActiveRun)
    }

    /// Drops the current run, its selection and its timer.
    fn abandon_run(&mut self) {
        self.poller.stop();
        self.store.clear();
        self.selection.clear();
    }

    // ── Upload session ────────────────────────────────────────────────────────

    /// A new job description starts over: prior run, selection, timer and
    /// resumes are discarded once the backend accepts it.
    pub async fn upload_job_description(
        &mut self,
        file: UploadFile,
    ) -> Result<DocumentMeta, ControllerError> {
        let doc = self.api.upload_jd(file).await?;
        self.abandon_run();
        self.session.begin(doc.clone());
        info!(jd_id = %doc.id, filename = %doc.filename, "job description uploaded");
        Ok(doc)
    }

    pub async fn upload_resumes(
        &mut self,
        files: Vec<UploadFile>,
    ) -> Result<Vec<DocumentMeta>, ControllerError> {
        if files.is_empty() {
            return Err(ControllerError::NoResumes);
        }
        let docs = self.api.upload_resumes(files).await?;
        self.session.add_resumes(docs.iter().cloned());
        info!(count = docs.len(), "resumes uploaded");
        Ok(docs)
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentMeta>, ControllerError> {
        Ok(self.api.list_documents().await?)
    }

    pub fn set_top_n(&mut self, n: usize) -> Result<(), ControllerError> {
        self.session.set_top_n(n)
    }

    // ── Run lifecycle ─────────────────────────────────────────────────────────

    /// Starts a run for the uploaded documents and arms polling for it.
    pub async fn launch(&mut self) -> Result<PipelineRunResponse, ControllerError> {
        let jd_id = self
            .session
            .jd()
            .map(|d| d.id.clone())
            .ok_or(ControllerError::NoJobDescription)?;
        if self.session.resumes().is_empty() {
            return Err(ControllerError::NoResumes);
        }
        let top_n = self.session.effective_top_n();

        let snapshot = self.api.start_run(&jd_id, top_n).await?;
        self.abandon_run();
        self.store.activate(snapshot.clone());
        self.poller.start(&snapshot.run_id);

        info!(run_id = %snapshot.run_id, top_n, "pipeline launched");
        self.note(
            JournalRecord::new(JournalEvent::Launched)
                .run(&snapshot.run_id)
                .status(snapshot.status)
                .detail(&format!("jd={jd_id} top_n={top_n}")),
        );
        Ok(snapshot)
    }

    /// Fetches the active run once and re-arms polling if it is still working.
    pub async fn refresh(&mut self) -> Result<PipelineRunResponse, ControllerError> {
        let (run_id, _) = self.require_active_run()?;
        let ticket = self.store.issue(&run_id).ok_or(ControllerError::NoActiveRun)?;
        let snapshot = self.api.get_run(&run_id).await?;
        self.store.apply(&ticket, snapshot.clone());
        if snapshot.status.is_active() && !self.poller.is_armed() {
            self.poller.start(&run_id);
        }
        Ok(snapshot)
    }

    // ── Approval ──────────────────────────────────────────────────────────────

    /// Returns whether `resume_id` is selected after the flip.
    pub fn toggle(&mut self, resume_id: &str) -> bool {
        self.selection.toggle(resume_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Approves the current selection for the active run.
    pub async fn approve_selection(&mut self) -> Result<PipelineRunResponse, ControllerError> {
        let (run_id, _) = self.require_active_run()?;
        let ids = self.selection.ids();
        self.approve(&run_id, &ids).await
    }

    /// On failure the snapshot and the selection are left exactly as they were.
    pub async fn approve(
        &mut self,
        run_id: &str,
        selected_ids: &[String],
    ) -> Result<PipelineRunResponse, ControllerError> {
        if selected_ids.is_empty() {
            return Err(ControllerError::EmptySelection);
        }
        let (active, status) = self.require_active_run()?;
        if active != run_id {
            return Err(ControllerError::NoActiveRun);
        }
        if !status.accepts_approval() {
            return Err(ControllerError::ActionNotAllowed {
                action: "approve",
                status,
            });
        }

        let ticket = self.store.issue(run_id).ok_or(ControllerError::NoActiveRun)?;
        let snapshot = self.api.approve(run_id, selected_ids).await?;
        self.store.apply(&ticket, snapshot.clone());
        self.selection.clear();
        self.poller.start(run_id);

        let detail = selected_ids.join(",");
        info!(run_id, approved = selected_ids.len(), "candidates approved");
        self.note(
            JournalRecord::new(JournalEvent::Approved)
                .run(run_id)
                .status(snapshot.status)
                .detail(&detail),
        );
        Ok(snapshot)
    }

    // ── Editing ───────────────────────────────────────────────────────────────

    /// Opens a draft of the email currently held for `resume_id`.
    pub fn open_draft(&self, resume_id: &str) -> Option<EmailDraft> {
        self.store.with_snapshot(|snap| {
            let snap = snap?;
            views::email_lookup(&snap.emails)
                .get(resume_id)
                .map(|email| EmailDraft::open(email))
        })
    }

    pub async fn save_draft(
        &mut self,
        draft: &EmailDraft,
    ) -> Result<PipelineRunResponse, ControllerError> {
        let (run_id, _) = self.require_active_run()?;
        self.edit_email(&run_id, draft.resume_id(), draft.subject(), draft.body())
            .await
    }

    /// Does not touch polling: an edit leaves the run status as it was.
    pub async fn edit_email(
        &mut self,
        run_id: &str,
        resume_id: &str,
        subject: &str,
        body: &str,
    ) -> Result<PipelineRunResponse, ControllerError> {
        let ticket = self.store.issue(run_id).ok_or(ControllerError::NoActiveRun)?;
        let snapshot = self.api.edit_email(run_id, resume_id, subject, body).await?;
        self.store.apply(&ticket, snapshot.clone());

        info!(run_id, resume_id, "outreach email updated");
        self.note(
            JournalRecord::new(JournalEvent::EmailEdited)
                .run(run_id)
                .detail(resume_id),
        );
        Ok(snapshot)
    }

    // ── Session ───────────────────────────────────────────────────────────────

    /// Local state is only discarded once the backend confirms the reset.
    pub async fn reset_session(&mut self) -> Result<(), ControllerError> {
        self.api.reset_session().await?;
        let run_id = self.store.active_run_id();
        self.abandon_run();
        self.session.clear();

        info!("session reset");
        let mut rec = JournalRecord::new(JournalEvent::SessionReset);
        if let Some(run_id) = run_id.as_deref() {
            rec = rec.run(run_id);
        }
        self.note(rec);
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.poller.stop();
    }
}
