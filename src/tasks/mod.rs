pub mod jobs;
pub mod orchestrator;
pub mod writer;
