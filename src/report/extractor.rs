//! Failed-assertion extraction from runner JSON reports
//!
//! Reports follow the Jest JSON layout produced by `selenium-side-runner`:
//! `{ testResults: [ { assertionResults: [ { status, title, failureMessages } ] } ] }`.
//! Unknown fields are ignored and absent collections count as empty.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::escape::unescape;
use crate::common::{Error, Result};

/// Status value marking a failed assertion
const FAILED_STATUS: &str = "failed";

/// Top-level report document
#[derive(Debug, Deserialize)]
struct Report {
    #[serde(default, rename = "testResults")]
    test_results: Option<Vec<TestFileResult>>,
}

/// Results for one test file
///
/// Assertions stay untyped until they are known to have failed, so entries
/// that get skipped may carry any shape.
#[derive(Debug, Deserialize)]
struct TestFileResult {
    #[serde(default, rename = "assertionResults")]
    assertion_results: Option<Vec<Value>>,
}

/// A failed assertion
#[derive(Debug, Deserialize)]
struct FailedAssertion {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "failureMessages")]
    failure_messages: Option<Vec<String>>,
}

/// A failed assertion with its decoded failure messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    pub title: Option<String>,
    #[serde(rename = "failureMessages")]
    pub failure_messages: Vec<String>,
}

/// Extract the failed assertions from the report at `path`
///
/// Entries keep the report's order. A message whose escapes cannot be
/// decoded aborts the extraction with `DecodeFault`.
pub fn extract_failed(path: &Path) -> Result<Vec<FailedTest>> {
    if !path.is_file() {
        return Err(Error::ReportNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ReportNotFound(path.to_path_buf()),
        _ => Error::file_read(path, &e),
    })?;

    let failed = failed_tests(&bytes).map_err(|e| match e {
        Error::InvalidFormat(reason) => {
            Error::InvalidFormat(format!("report '{}': {reason}", path.display()))
        }
        other => other,
    })?;

    tracing::debug!(report = %path.display(), failed = failed.len(), "Extracted failed tests");
    Ok(failed)
}

/// Extract the failed assertions from raw report bytes
pub fn failed_tests(bytes: &[u8]) -> Result<Vec<FailedTest>> {
    let report: Report = serde_json::from_slice(bytes)
        .map_err(|e| Error::invalid_format(format!("not a valid report document: {e}")))?;

    let assertions = report
        .test_results
        .unwrap_or_default()
        .into_iter()
        .flat_map(|file| file.assertion_results.unwrap_or_default())
        .filter(|assertion| {
            assertion.get("status").and_then(Value::as_str) == Some(FAILED_STATUS)
        });

    let mut failed = Vec::new();
    for assertion in assertions {
        let assertion: FailedAssertion = serde_json::from_value(assertion)
            .map_err(|e| Error::invalid_format(format!("malformed failed assertion: {e}")))?;
        let failure_messages = assertion
            .failure_messages
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, message)| {
                unescape(message).map_err(|e| Error::DecodeFault {
                    title: assertion.title.clone().unwrap_or_default(),
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        failed.push(FailedTest {
            title: assertion.title,
            failure_messages,
        });
    }

    Ok(failed)
}
