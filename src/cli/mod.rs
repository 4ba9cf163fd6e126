//! CLI command handling
//!
//! Dispatches CLI commands to the scenario store, orchestrator and report
//! extractor, and formats their results.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use serde::Serialize;

use crate::commands::Commands;
use crate::common::{Config, Error, ErrorKind, Result};
use crate::report::{self, FailedTest};
use crate::runner::{ExecutionOutcome, ExecutionStatus, Orchestrator};
use crate::scenario::{ScenarioInfo, ScenarioStore, SCENARIO_EXTENSION};

/// Options shared by every command
pub struct Context {
    pub config: Arc<Config>,
    /// Emit machine-readable JSON instead of text
    pub json: bool,
}

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands, ctx: &Context) -> Result<i32> {
    if !matches!(command, Commands::Failed { .. }) {
        ctx.config.ensure_dirs()?;
    }
    let store = ScenarioStore::from_config(&ctx.config);

    match command {
        Commands::List => {
            let scenarios = store.list()?;
            if ctx.json {
                print_json(&scenarios)?;
            } else if scenarios.is_empty() {
                println!("No scenarios stored in {}", store.root().display());
            } else {
                for info in &scenarios {
                    print_scenario(info);
                }
            }
            Ok(0)
        }

        Commands::Get { side_id, output } => {
            let bytes = store.get(&side_id)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    if !ctx.json {
                        println!("Wrote {} ({} bytes)", path.display(), bytes.len());
                    }
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&bytes)?;
                    stdout.flush()?;
                }
            }
            Ok(0)
        }

        Commands::Put { side_id, file } => {
            if !has_scenario_extension(&file) {
                return Err(Error::InvalidFileExtension(file));
            }
            let bytes = std::fs::read(&file).map_err(|e| Error::file_read(&file, &e))?;
            let info = store.put(&side_id, &bytes)?;

            if ctx.json {
                print_json(&info)?;
            } else {
                println!(
                    "{} Uploaded {} ({} bytes)",
                    "✓".green(),
                    info.filename,
                    info.size
                );
            }
            Ok(0)
        }

        Commands::Delete { side_id } => {
            store.delete(&side_id)?;
            if ctx.json {
                print_json(&serde_json::json!({ "side_id": side_id, "deleted": true }))?;
            } else {
                println!("Deleted scenario {side_id}");
            }
            Ok(0)
        }

        Commands::Run {
            side_id,
            failed,
            timeout,
        } => run(ctx, &side_id, failed, timeout).await,

        Commands::Failed {
            report,
            indent,
            plain,
        } => {
            let failed = report::extract_failed(&report)?;
            print_failed(&failed, indent, plain)?;
            Ok(0)
        }

        Commands::Health => {
            let health = Health::collect(&ctx.config, &store);
            if ctx.json {
                print_json(&health)?;
            } else {
                health.print();
            }
            Ok(if health.runner.is_some() { 0 } else { 1 })
        }
    }
}

/// Exit code for a failed command
pub fn exit_code(error: &Error) -> i32 {
    match (error, error.kind()) {
        (Error::Interrupted, _) => 130,
        (_, ErrorKind::Timeout) => 2,
        _ => 1,
    }
}

async fn run(ctx: &Context, side_id: &str, extract: bool, timeout: Option<u64>) -> Result<i32> {
    let mut orchestrator = Orchestrator::new(Arc::clone(&ctx.config))?;
    if let Some(secs) = timeout {
        if secs == 0 {
            return Err(Error::Config("--timeout must be greater than zero".to_string()));
        }
        orchestrator = orchestrator.with_timeout(Duration::from_secs(secs));
    }

    if !ctx.json {
        println!("{} {}", "Running scenario:".blue().bold(), side_id.white().bold());
        println!("  Grid: {}", ctx.config.grid.url.dimmed());
    }

    // Dropping the execution future kills the runner's process group
    let outcome = tokio::select! {
        outcome = orchestrator.execute(side_id) => outcome?,
        _ = tokio::signal::ctrl_c() => return Err(Error::Interrupted),
    };
    let outcome = outcome.into_result()?;

    let failed = match (&outcome.report_path, extract) {
        (Some(path), true) => Some(report::extract_failed(path)?),
        _ => None,
    };

    if ctx.json {
        print_json(&RunOutput {
            outcome: &outcome,
            failed: failed.as_deref(),
        })?;
    } else {
        print_outcome(&outcome);
        if let Some(failed) = &failed {
            if failed.is_empty() {
                println!("\n{}", "No failed tests in report".green());
            } else {
                println!("\n{}", "Failed tests:".red().bold());
                print!("{}", report::render::to_plain(failed));
            }
        } else if extract {
            println!("\n{}", "No report to extract failures from".yellow());
        }
    }

    Ok(match outcome.status {
        ExecutionStatus::Success => 0,
        _ => 1,
    })
}

#[derive(Serialize)]
struct RunOutput<'a> {
    #[serde(flatten)]
    outcome: &'a ExecutionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<&'a [FailedTest]>,
}

/// Runner and storage status
#[derive(Serialize)]
struct Health {
    status: &'static str,
    selenium_grid_url: String,
    runner: Option<String>,
    scenarios_dir: String,
    reports_dir: String,
    scenarios: usize,
    timeout_secs: u64,
}

impl Health {
    fn collect(config: &Config, store: &ScenarioStore) -> Self {
        let runner = config.resolve_runner().ok();
        Self {
            status: if runner.is_some() { "healthy" } else { "degraded" },
            selenium_grid_url: config.grid.url.clone(),
            runner: runner.map(|path| path.display().to_string()),
            scenarios_dir: config.storage.scenarios_dir.display().to_string(),
            reports_dir: config.storage.reports_dir.display().to_string(),
            scenarios: store.list().map(|list| list.len()).unwrap_or(0),
            timeout_secs: config.runner.timeout_secs,
        }
    }

    fn print(&self) {
        let status = if self.runner.is_some() {
            self.status.green()
        } else {
            self.status.yellow()
        };
        println!("Status:    {status}");
        println!("Grid:      {}", self.selenium_grid_url);
        match &self.runner {
            Some(path) => println!("Runner:    {path}"),
            None => println!("Runner:    {}", "not found".red()),
        }
        println!("Scenarios: {} ({})", self.scenarios_dir, self.scenarios);
        println!("Reports:   {}", self.reports_dir);
        println!("Timeout:   {}s", self.timeout_secs);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_scenario(info: &ScenarioInfo) {
    println!(
        "  {:<30} {:<34} {:>8} bytes",
        info.side_id,
        info.filename.dimmed(),
        info.size
    );
}

fn print_outcome(outcome: &ExecutionOutcome) {
    let status = match outcome.status {
        ExecutionStatus::Success => format!("✓ {}", outcome.status).green().bold(),
        ExecutionStatus::Failed => format!("✗ {}", outcome.status).red().bold(),
        ExecutionStatus::TimedOut => format!("⏱ {}", outcome.status).yellow().bold(),
    };
    println!("\n{status} in {:.1}s", outcome.elapsed_ms as f64 / 1000.0);
    println!("  Execution: {}", outcome.execution_id.dimmed());
    if let Some(path) = &outcome.report_path {
        println!("  Report:    {}", path.display());
    }
    println!("\n{}", outcome.message);
}

fn print_failed(failed: &[FailedTest], indent: usize, plain: bool) -> Result<()> {
    if plain {
        print!("{}", report::render::to_plain(failed));
    } else {
        println!("{}", report::render::to_json(failed, indent)?);
    }
    Ok(())
}

/// Whether `path` looks like a scenario upload
fn has_scenario_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SCENARIO_EXTENSION)
}
