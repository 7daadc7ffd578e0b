use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::store::{ApplyOutcome, RunStore};
use crate::api::PipelineApi;
use crate::journal::{JournalEvent, JournalRecord, RunJournal};

/// Periodic status refresh for the active run. At most one loop exists at a
/// time; arming again replaces the previous loop.
pub struct PollScheduler {
    api: Arc<dyn PipelineApi>,
    store: RunStore,
    interval: Duration,
    journal: Option<RunJournal>,
    handle: Option<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn new(api: Arc<dyn PipelineApi>, store: RunStore, interval: Duration) -> Self {
        Self {
            api,
            store,
            interval,
            journal: None,
            handle: None,
        }
    }

    pub fn with_journal(mut self, journal: Option<RunJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Arms polling for `run_id`. The first fetch happens one interval from now.
    pub fn start(&mut self, run_id: &str) {
        self.stop();
        debug!(run_id, interval_ms = self.interval.as_millis() as u64, "polling armed");
        let task = PollTask {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
            interval: self.interval,
            journal: self.journal.clone(),
            run_id: run_id.to_string(),
            first_tick: Instant::now() + self.interval,
        };
        self.handle = Some(tokio::spawn(task.run()));
    }

    /// Disarms the loop and abandons any fetch still in flight.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PollTask {
    api: Arc<dyn PipelineApi>,
    store: RunStore,
    interval: Duration,
    journal: Option<RunJournal>,
    run_id: String,
    first_tick: Instant,
}

impl PollTask {
    async fn run(self) {
        let mut ticker = tokio::time::interval_at(self.first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(ticket) = self.store.issue(&self.run_id) else {
                debug!(run_id = %self.run_id, "run no longer active; polling stopped");
                return;
            };

            let snapshot = match self.api.get_run(&self.run_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(run_id = %self.run_id, "status poll failed: {e}");
                    self.note(JournalRecord::new(JournalEvent::PollFailed).detail(&e.to_string()));
                    return;
                }
            };

            let status = snapshot.status;
            match self.store.apply(&ticket, snapshot) {
                ApplyOutcome::Applied { previous } => {
                    if previous != Some(status) {
                        info!(run_id = %self.run_id, status = status.as_str(), "run status changed");
                        self.note(JournalRecord::new(JournalEvent::StatusChanged).status(status));
                    }
                    if !status.is_active() {
                        debug!(run_id = %self.run_id, status = status.as_str(), "polling stopped");
                        return;
                    }
                }
                ApplyOutcome::Superseded => {
                    debug!(run_id = %self.run_id, "poll response superseded");
                }
                ApplyOutcome::StaleRun => {
                    debug!(run_id = %self.run_id, "poll response for abandoned run discarded");
                    return;
                }
            }
        }
    }

    fn note(&self, rec: JournalRecord<'_>) {
        if let Some(journal) = &self.journal {
            journal.record(rec.run(&self.run_id));
        }
    }
}
