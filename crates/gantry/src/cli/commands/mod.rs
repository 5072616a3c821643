//! CLI commands

mod completions;
mod init;
mod pipeline;

pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use pipeline::{run_pipeline, PipelineArgs};
