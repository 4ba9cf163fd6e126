//! CLI command definitions
//!
//! Defines the clap commands for side-runner.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// List stored scenarios
    #[command(alias = "ls")]
    List,

    /// Print a stored scenario
    Get {
        /// Scenario id
        side_id: String,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Upload (or replace) a scenario
    Put {
        /// Scenario id
        side_id: String,

        /// Selenium IDE file to upload (must end in .side)
        file: PathBuf,
    },

    /// Delete a stored scenario
    #[command(alias = "rm")]
    Delete {
        /// Scenario id
        side_id: String,
    },

    /// Run a scenario against the Selenium grid
    Run {
        /// Scenario id
        side_id: String,

        /// Also extract failed tests from the produced report
        #[arg(long)]
        failed: bool,

        /// Timeout in seconds (default: runner.timeout_secs)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Extract failed tests from a runner JSON report
    Failed {
        /// Path to the report written by selenium-side-runner
        report: PathBuf,

        /// JSON indentation
        #[arg(long, default_value = "2")]
        indent: usize,

        /// Print failure messages as plain text
        #[arg(long)]
        plain: bool,
    },

    /// Show grid endpoint, runner and storage status
    Health,
}
