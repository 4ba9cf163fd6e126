//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Environment variable overriding the grid endpoint
pub const GRID_URL_ENV: &str = "SELENIUM_GRID_URL";

/// Executable searched on PATH when `runner.path` is not configured
pub const DEFAULT_RUNNER: &str = "selenium-side-runner";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Remote browser grid settings
    #[serde(default)]
    pub grid: GridConfig,

    /// External runner settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Scenario and report storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote browser grid settings
#[derive(Debug, Deserialize, Clone)]
pub struct GridConfig {
    /// WebDriver endpoint passed to the runner as `--server`
    #[serde(default = "default_grid_url")]
    pub url: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            url: default_grid_url(),
        }
    }
}

fn default_grid_url() -> String {
    "http://localhost:4444/wd/hub".to_string()
}

/// Configuration for the external runner process
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Path to the runner executable (searched on PATH when unset)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Additional arguments placed before the generated ones
    #[serde(default)]
    pub args: Vec<String>,

    /// Wall-clock limit for a single execution
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    300
}

/// Storage locations
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding `.side` scenario files
    #[serde(default = "default_scenarios_dir")]
    pub scenarios_dir: PathBuf,

    /// Directory receiving runner reports
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// File name pattern of report artifacts, with a single `*`
    #[serde(default = "default_report_pattern")]
    pub report_pattern: String,

    /// Give every execution its own output directory under `reports_dir`
    #[serde(default = "default_isolate")]
    pub isolate_executions: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scenarios_dir: default_scenarios_dir(),
            reports_dir: default_reports_dir(),
            report_pattern: default_report_pattern(),
            isolate_executions: default_isolate(),
        }
    }
}

fn default_scenarios_dir() -> PathBuf {
    PathBuf::from("scenarios")
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}
fn default_report_pattern() -> String {
    "results-*.json".to_string()
}
fn default_isolate() -> bool {
    true
}

impl Config {
    /// Load configuration from `path`, or from the default config file
    ///
    /// Returns default configuration if no file exists. The grid URL can be
    /// overridden with `SELENIUM_GRID_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(url) = std::env::var(GRID_URL_ENV) {
            if !url.trim().is_empty() {
                config.grid.url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.runner.timeout_secs == 0 {
            return Err(Error::Config(
                "runner.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.grid.url.trim().is_empty() {
            return Err(Error::Config("grid.url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Execution timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.runner.timeout_secs)
    }

    /// Resolve the runner executable
    ///
    /// Falls back to searching PATH if not explicitly configured
    pub fn resolve_runner(&self) -> Result<PathBuf> {
        if let Some(path) = &self.runner.path {
            return Ok(path.clone());
        }
        which::which(DEFAULT_RUNNER).map_err(|_| Error::RunnerNotFound(DEFAULT_RUNNER.to_string()))
    }

    /// Create the scenario and report directories if they are missing
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.scenarios_dir)?;
        std::fs::create_dir_all(&self.storage.reports_dir)?;
        Ok(())
    }
}
