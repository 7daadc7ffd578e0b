use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;

use crate::types::{PipelineRunResponse, PipelineStatus};

/// What observers see: which run is current and its latest snapshot.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub active_run: Option<String>,
    pub snapshot: Option<PipelineRunResponse>,
    applied_seq: u64,
}

impl RunState {
    pub fn status(&self) -> Option<PipelineStatus> {
        self.snapshot.as_ref().map(|s| s.status)
    }
}

/// Drawn before a request whose response may replace the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub run_id: String,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { previous: Option<PipelineStatus> },
    /// The response belongs to a run that is no longer the active one.
    StaleRun,
    /// A response to a later request for the same run was applied already.
    Superseded,
}

/// Holds the single active run snapshot. Cloning yields another handle to the same store.
#[derive(Debug, Clone)]
pub struct RunStore {
    state: Arc<watch::Sender<RunState>>,
    next_seq: Arc<AtomicU64>,
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunState::default());
        Self {
            state: Arc::new(tx),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Option<PipelineRunResponse> {
        self.state.borrow().snapshot.clone()
    }

    pub fn active_run_id(&self) -> Option<String> {
        self.state.borrow().active_run.clone()
    }

    pub fn status(&self) -> Option<PipelineStatus> {
        self.state.borrow().status()
    }

    /// The active run id together with its last observed status.
    pub fn active(&self) -> Option<(String, PipelineStatus)> {
        let state = self.state.borrow();
        Some((state.active_run.clone()?, state.status()?))
    }

    /// Reads the current snapshot without cloning it.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(Option<&PipelineRunResponse>) -> R) -> R {
        f(self.state.borrow().snapshot.as_ref())
    }

    fn draw_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Makes `snapshot` the current run. Tickets drawn before this call can no longer apply.
    pub fn activate(&self, snapshot: PipelineRunResponse) {
        let seq = self.draw_seq();
        self.state.send_modify(|state| {
            state.active_run = Some(snapshot.run_id.clone());
            state.snapshot = Some(snapshot);
            state.applied_seq = seq;
        });
    }

    /// `None` when `run_id` is not the active run.
    pub fn issue(&self, run_id: &str) -> Option<Ticket> {
        if self.state.borrow().active_run.as_deref() != Some(run_id) {
            return None;
        }
        Some(Ticket {
            run_id: run_id.to_string(),
            seq: self.draw_seq(),
        })
    }

    /// Replaces the snapshot wholesale, unless the response is addressed to an
    /// abandoned run or is older than what is already held.
    pub fn apply(&self, ticket: &Ticket, snapshot: PipelineRunResponse) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::StaleRun;
        self.state.send_if_modified(|state| {
            if state.active_run.as_deref() != Some(ticket.run_id.as_str())
                || snapshot.run_id != ticket.run_id
            {
                return false;
            }
            if ticket.seq <= state.applied_seq {
                outcome = ApplyOutcome::Superseded;
                return false;
            }
            let previous = state.status();
            state.snapshot = Some(snapshot);
            state.applied_seq = ticket.seq;
            outcome = ApplyOutcome::Applied { previous };
            true
        });
        outcome
    }

    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            let changed = state.active_run.is_some() || state.snapshot.is_some();
            state.active_run = None;
            state.snapshot = None;
            changed
        });
    }
}
