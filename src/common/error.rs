//! Error types for side-runner
//!
//! Every error carries a stable kind (see [`ErrorKind`]) so callers sitting on
//! top of the library can map failures onto their own transport without
//! matching on message text.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for side-runner
#[derive(Error, Debug)]
pub enum Error {
    // === Lookup Errors ===
    #[error("Scenario '{0}' not found. Use 'side-runner list' to see stored scenarios")]
    ScenarioNotFound(String),

    #[error("Report file not found: {}", .0.display())]
    ReportNotFound(PathBuf),

    // === Format Errors ===
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid scenario id '{0}': ids must be a plain file name")]
    InvalidScenarioId(String),

    #[error("Invalid file extension for '{}': expected a .side file", .0.display())]
    InvalidFileExtension(PathBuf),

    // === Execution Errors ===
    #[error("Scenario execution timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Runner executable '{0}' not found. Install it or set runner.path in the config file")]
    RunnerNotFound(String),

    #[error("Failed to spawn runner '{}': {error}", .program.display())]
    SpawnFailed {
        program: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("I/O error while running scenario: {0}")]
    ProcessIo(#[source] io::Error),

    #[error("Execution interrupted; the runner was stopped")]
    Interrupted,

    // === Report Decoding Errors ===
    #[error("Failed to decode failure message {index} of '{title}': {reason}")]
    DecodeFault {
        title: String,
        index: usize,
        reason: String,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stable classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidFormat,
    Timeout,
    ProcessFault,
    DecodeFault,
    Config,
    Io,
}

impl ErrorKind {
    /// Upper-snake code used in machine-readable output
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidFormat => "INVALID_FORMAT",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ProcessFault => "PROCESS_FAULT",
            ErrorKind::DecodeFault => "DECODE_FAULT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Io => "IO",
        }
    }
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ScenarioNotFound(_) | Error::ReportNotFound(_) => ErrorKind::NotFound,
            Error::InvalidFormat(_)
            | Error::InvalidScenarioId(_)
            | Error::InvalidFileExtension(_)
            | Error::Json(_) => ErrorKind::InvalidFormat,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::RunnerNotFound(_)
            | Error::SpawnFailed { .. }
            | Error::ProcessIo(_)
            | Error::Interrupted => ErrorKind::ProcessFault,
            Error::DecodeFault { .. } => ErrorKind::DecodeFault,
            Error::Config(_) | Error::ConfigParse(_) => ErrorKind::Config,
            Error::Io(_) | Error::FileRead { .. } => ErrorKind::Io,
        }
    }

    /// Create an invalid format error
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }

    /// Create a file read error for `path`
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

/// Serializable error for `--json` output
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
}

impl From<&Error> for ErrorReport {
    fn from(e: &Error) -> Self {
        Self {
            code: e.kind().code().to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_share_kind() {
        assert_eq!(
            Error::ScenarioNotFound("login".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::ReportNotFound(PathBuf::from("r.json")).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_error_report_carries_code_and_message() {
        let err = Error::Timeout(Duration::from_secs(300));
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, "TIMEOUT");
        assert!(report.message.contains("300 seconds"));
    }

    #[test]
    fn test_sub_second_timeout_message() {
        let err = Error::Timeout(Duration::from_millis(250));
        assert!(err.to_string().ends_with("after 0.25 seconds"), "{err}");
    }

    #[test]
    fn test_json_errors_are_invalid_format() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }
}
