pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_pipeline, run_pipeline_reported, PipelineSummary};
pub use types::{NoOpReporter, PipelineStage, ProgressReporter};
