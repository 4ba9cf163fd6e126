//! Scenario document validation

use serde_json::Value;

use crate::common::{Error, Result};

/// File extension used for stored scenarios (without the dot)
pub const SCENARIO_EXTENSION: &str = "side";

/// Top-level keys every scenario document must carry
const REQUIRED_KEYS: [&str; 2] = ["version", "tests"];

/// Check that `bytes` hold a well-formed scenario document
///
/// The document must be a JSON object containing both `version` and `tests`.
/// Their values are not inspected.
pub fn check_scenario(bytes: &[u8]) -> Result<()> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::invalid_format(format!("scenario is not valid JSON: {e}")))?;

    let object = document
        .as_object()
        .ok_or_else(|| Error::invalid_format("scenario must be a JSON object"))?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();

    if !missing.is_empty() {
        return Err(Error::invalid_format(format!(
            "scenario is missing required key(s): {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;

    #[test]
    fn test_accepts_any_value_types() {
        check_scenario(br#"{"version": "2.0", "tests": []}"#).unwrap();
        check_scenario(br#"{"version": null, "tests": 7, "extra": true}"#).unwrap();
    }

    #[test]
    fn test_rejects_missing_keys() {
        let err = check_scenario(br#"{"version": "2.0"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert!(err.to_string().contains("tests"));

        let err = check_scenario(br#"{}"#).unwrap_err();
        assert!(err.to_string().contains("version, tests"));
    }

    #[test]
    fn test_rejects_non_json_and_non_objects() {
        assert!(check_scenario(b"not json").is_err());
        assert!(check_scenario(b"").is_err());
        assert!(check_scenario(br#"["version", "tests"]"#).is_err());
    }
}
