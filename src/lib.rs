//! side-runner - Selenium IDE scenario runner
//!
//! Stores Selenium IDE `.side` scenarios, runs them against a remote browser
//! grid through `selenium-side-runner` with a hard timeout, and distills the
//! resulting JSON report down to the assertions that failed.

pub mod cli;
pub mod commands;
pub mod common;
pub mod report;
pub mod runner;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Config, Error, ErrorKind, Result};
pub use report::{extract_failed, FailedTest};
pub use runner::{ExecutionOutcome, ExecutionStatus, Orchestrator};
pub use scenario::{ScenarioInfo, ScenarioStore};
