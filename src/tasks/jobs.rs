use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::{BatchJob, BatchState, JobStatus, UnitOutcome};

/// In-memory job handles. Nothing here survives a restart.
///
/// At most `max_finished` finished jobs are kept; the oldest finished ones are
/// evicted when a new job registers. Running jobs are never evicted.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, JobStatus>>,
    max_finished: usize,
}

impl JobRegistry {
    pub fn new(max_finished: usize) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            max_finished,
        }
    }

    pub fn register(&self, job: BatchJob) -> Uuid {
        let id = Uuid::new_v4();
        let mut jobs = self.jobs.lock();
        evict_finished(&mut jobs, self.max_finished);
        jobs.insert(id, JobStatus::new(id, job));
        id
    }

    /// Ends a job whose task died without reaching `Done` on its own.
    pub fn abandon(&self, id: Uuid, reason: &str) {
        self.update(id, |status| {
            if status.is_done() {
                return;
            }
            status.state = BatchState::Done;
            status.finished_at = Some(Utc::now());
            status.error = Some(reason.to_string());
        });
    }

    pub fn update(&self, id: Uuid, apply: impl FnOnce(&mut JobStatus)) {
        if let Some(status) = self.jobs.lock().get_mut(&id) {
            apply(status);
        }
    }

    pub fn record_outcome(&self, id: Uuid, outcome: &UnitOutcome) {
        self.update(id, |status| match outcome {
            UnitOutcome::Recorded => status.succeeded += 1,
            UnitOutcome::Failed(failure) => {
                status.failed += 1;
                status.failures.push(failure.clone());
            }
        });
    }

    pub fn get(&self, id: Uuid) -> Option<JobStatus> {
        self.jobs.lock().get(&id).cloned()
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<_> = self.jobs.lock().values().cloned().collect();
        jobs.sort_by_key(|status| status.submitted_at);
        jobs
    }

    pub fn running(&self) -> usize {
        self.jobs
            .lock()
            .values()
            .filter(|status| !status.is_done())
            .count()
    }
}

fn evict_finished(jobs: &mut HashMap<Uuid, JobStatus>, keep: usize) {
    let mut finished: Vec<_> = jobs
        .values()
        .filter(|status| status.is_done())
        .map(|status| (status.finished_at, status.submitted_at, status.id))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort();
    let excess = finished.len() - keep;
    for (_, _, id) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
    tracing::debug!(target: "batch", evicted = excess, "finished jobs evicted");
}
