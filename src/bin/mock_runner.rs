//! Mock selenium-side-runner binary for integration testing
//!
//! Accepts the same command line as the real runner
//! (`--server <url> <scenario.side> --output-directory <dir>`) and writes a
//! Jest-style JSON report without touching a browser. Every test in the
//! scenario passes unless its name contains "fail".
//!
//! Behaviour can be tuned with environment variables:
//! - `MOCK_RUNNER_SLEEP_MS`: delay before doing anything
//! - `MOCK_RUNNER_STDERR`: text written to stderr
//! - `MOCK_RUNNER_EXIT`: exit code override
//! - `MOCK_RUNNER_NO_REPORT`: skip writing the report

use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn main() {
    let mut server = None;
    let mut output_dir = None;
    let mut scenario = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--server" => server = args.next(),
            "--output-directory" => output_dir = args.next().map(PathBuf::from),
            other if !other.starts_with("--") => scenario = Some(PathBuf::from(other)),
            _ => {}
        }
    }

    if let Some(ms) = env_u64("MOCK_RUNNER_SLEEP_MS") {
        std::thread::sleep(Duration::from_millis(ms));
    }

    if let Ok(text) = std::env::var("MOCK_RUNNER_STDERR") {
        eprintln!("{text}");
    }

    let (Some(server), Some(output_dir), Some(scenario)) = (server, output_dir, scenario) else {
        eprintln!("usage: mock-runner --server <url> <file.side> --output-directory <dir>");
        std::process::exit(64);
    };

    let document: Value = match std::fs::read(&scenario)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    {
        Some(document) => document,
        None => {
            eprintln!("cannot read scenario {}", scenario.display());
            std::process::exit(65);
        }
    };

    let names: Vec<String> = document["tests"]
        .as_array()
        .map(|tests| {
            tests
                .iter()
                .filter_map(|t| t["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let assertions: Vec<Value> = names
        .iter()
        .map(|name| {
            if name.contains("fail") {
                json!({
                    "status": "failed",
                    "title": name,
                    "fullName": name,
                    // Messages come out escaped one level too deep, like the real runner
                    "failureMessages": [format!("Error: {name} failed on {server}\\n    at step 1")],
                })
            } else {
                json!({
                    "status": "passed",
                    "title": name,
                    "fullName": name,
                    "failureMessages": [],
                })
            }
        })
        .collect();

    let failures = assertions
        .iter()
        .filter(|a| a["status"] == "failed")
        .count();

    println!("Running {} test(s) on {server}", names.len());

    if std::env::var_os("MOCK_RUNNER_NO_REPORT").is_none() {
        let report = json!({
            "numTotalTests": names.len(),
            "numFailedTests": failures,
            "success": failures == 0,
            "testResults": [{
                "name": scenario.display().to_string(),
                "status": if failures == 0 { "passed" } else { "failed" },
                "assertionResults": assertions,
            }],
        });

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let path = output_dir.join(format!("results-{stamp}.json"));
        if let Err(e) = std::fs::write(&path, report.to_string()) {
            eprintln!("cannot write report {}: {e}", path.display());
            std::process::exit(74);
        }
    }

    let code = env_u64("MOCK_RUNNER_EXIT")
        .map(|c| c as i32)
        .unwrap_or(if failures == 0 { 0 } else { 1 });
    std::process::exit(code);
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
