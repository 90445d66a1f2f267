pub mod item;
pub mod job;

pub use item::{ExtractedFields, ScrapedItem, UnitKey};
pub use job::{BatchJob, BatchState, JobStatus, UnitFailure, UnitOutcome};
