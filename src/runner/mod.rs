//! Scenario execution through the external runner
//!
//! The runner (`selenium-side-runner`) is spawned once per execution with a
//! hard wall-clock timeout. Each execution writes its reports into its own
//! subdirectory of the reports directory, so the report found afterwards is
//! always the one this run produced.

mod orchestrator;
mod process;

pub use orchestrator::{ExecutionOutcome, ExecutionStatus, Orchestrator};
pub use process::{run_with_timeout, Completion, Invocation, ProcessOutput};
