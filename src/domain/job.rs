use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parameters of one batch. Names are bare resource names, resolved against
/// the data directory by `storage::ResourceFiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub input_file: String,
    pub output_file: String,
    pub jurisdiction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    TaxResolved,
    FetchingAll,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    pub url: String,
    pub error: String,
}

/// Terminal state of a single unit.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Recorded,
    Failed(UnitFailure),
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: Uuid,
    #[serde(flatten)]
    pub job: BatchJob,
    pub state: BatchState,
    pub tax_rate: Option<f64>,
    pub total_units: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<UnitFailure>,
    /// Times the output file was written during this batch.
    pub output_writes: usize,
    /// Set when the batch itself could not run (reference table, input or output I/O).
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn new(id: Uuid, job: BatchJob) -> Self {
        Self {
            id,
            job,
            state: BatchState::Idle,
            tax_rate: None,
            total_units: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            output_writes: 0,
            error: None,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == BatchState::Done
    }
}
