//! Scenario execution
//!
//! Validates the scenario, runs the external runner against the grid with a
//! hard timeout, then picks up the report it produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::process::{run_with_timeout, Completion, Invocation};
use crate::common::{Config, Error, Result};
use crate::report::{self, ReportPattern};
use crate::scenario::ScenarioStore;

/// Final classification of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
    TimedOut,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Result of one scenario execution
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Unique id of this execution
    pub execution_id: String,
    pub side_id: String,
    pub status: ExecutionStatus,
    /// Report located after the run, if any
    pub report_path: Option<PathBuf>,
    pub message: String,
    /// Runner exit code, `None` on timeout or signal termination
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: u64,
    pub timeout_ms: u64,
}

impl ExecutionOutcome {
    /// Convert a timed-out outcome into `Error::Timeout`
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            ExecutionStatus::TimedOut => {
                Err(Error::Timeout(Duration::from_millis(self.timeout_ms)))
            }
            _ => Ok(self),
        }
    }
}

/// Runs stored scenarios through the external runner
pub struct Orchestrator {
    config: Arc<Config>,
    store: ScenarioStore,
    pattern: ReportPattern,
    timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator from shared configuration
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let pattern = ReportPattern::parse(&config.storage.report_pattern)?;
        let store = ScenarioStore::from_config(&config);
        let timeout = config.timeout();

        Ok(Self {
            config,
            store,
            pattern,
            timeout,
        })
    }

    /// Override the execution timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute scenario `side_id`
    ///
    /// Missing or malformed scenarios fail before anything is spawned. A
    /// runner that overruns the timeout is killed and reported as
    /// `TimedOut` without a report lookup.
    pub async fn execute(&self, side_id: &str) -> Result<ExecutionOutcome> {
        let scenario = self.store.resolve(side_id)?;
        let program = self.config.resolve_runner()?;

        let execution_id = uuid::Uuid::new_v4().to_string();
        let output_dir = self.output_dir(&execution_id)?;

        let invocation = Invocation::side_runner(
            &program,
            &self.config.runner.args,
            &self.config.grid.url,
            &scenario,
            &output_dir,
        );

        tracing::info!(
            side_id,
            execution_id = %execution_id,
            grid = %self.config.grid.url,
            output_dir = %output_dir.display(),
            "Executing scenario"
        );

        let mut outcome = ExecutionOutcome {
            execution_id,
            side_id: side_id.to_string(),
            status: ExecutionStatus::TimedOut,
            report_path: None,
            message: String::new(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            elapsed_ms: 0,
            timeout_ms: self.timeout.as_millis() as u64,
        };

        let completion = match run_with_timeout(&invocation, self.timeout).await {
            Ok(completion) => completion,
            Err(e) => {
                self.discard_output_dir(&output_dir);
                return Err(e);
            }
        };

        let output = match completion {
            Completion::TimedOut { elapsed } => {
                self.discard_output_dir(&output_dir);
                outcome.elapsed_ms = elapsed.as_millis() as u64;
                outcome.message = Error::Timeout(self.timeout).to_string();
                tracing::warn!(
                    side_id,
                    execution_id = %outcome.execution_id,
                    elapsed_ms = outcome.elapsed_ms,
                    "Scenario timed out"
                );
                return Ok(outcome);
            }
            Completion::Exited(output) => output,
        };

        let report_path = report::latest(&output_dir, &self.pattern)?;
        if report_path.is_none() {
            self.discard_output_dir(&output_dir);
        }

        outcome.status = if output.success {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };
        outcome.message = describe(
            outcome.status,
            output.exit_code,
            &output.stderr,
            report_path.as_deref(),
        );
        outcome.report_path = report_path;
        outcome.exit_code = output.exit_code;
        outcome.stdout = output.stdout;
        outcome.stderr = output.stderr;
        outcome.elapsed_ms = output.elapsed.as_millis() as u64;

        tracing::info!(
            side_id,
            execution_id = %outcome.execution_id,
            status = %outcome.status,
            exit_code = ?outcome.exit_code,
            elapsed_ms = outcome.elapsed_ms,
            report = ?outcome.report_path,
            "Scenario finished"
        );

        Ok(outcome)
    }

    /// Directory the runner writes its reports into for this execution
    fn output_dir(&self, execution_id: &str) -> Result<PathBuf> {
        let reports_dir = &self.config.storage.reports_dir;
        let dir = if self.config.storage.isolate_executions {
            reports_dir.join(execution_id)
        } else {
            reports_dir.clone()
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove a per-execution directory the runner left empty
    fn discard_output_dir(&self, dir: &Path) {
        if !self.config.storage.isolate_executions {
            return;
        }
        // remove_dir refuses non-empty directories, so partial output survives
        if let Err(e) = std::fs::remove_dir(dir) {
            tracing::debug!(dir = %dir.display(), error = %e, "Keeping execution directory");
        }
    }
}

fn describe(
    status: ExecutionStatus,
    exit_code: Option<i32>,
    stderr: &str,
    report: Option<&Path>,
) -> String {
    let mut message = match status {
        ExecutionStatus::Success => "Scenario executed successfully".to_string(),
        _ => {
            let code = exit_code
                .map(|c| format!("exit code {c}"))
                .unwrap_or_else(|| "terminated by signal".to_string());
            format!("Scenario execution failed ({code}): {}", stderr.trim_end())
        }
    };
    match report {
        Some(path) => message.push_str(&format!("\nReport: {}", path.display())),
        None => message.push_str("\nNo report was produced"),
    }
    message
}
