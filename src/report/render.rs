//! Output formats for extracted failures

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::extractor::FailedTest;
use crate::common::Result;

/// Render failures as pretty-printed JSON with `indent` spaces per level
///
/// Non-ASCII text is written as-is rather than escaped.
pub fn to_json(failed: &[FailedTest], indent: usize) -> Result<String> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    failed.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render failures as plain text
///
/// Each failure is a `=== title ===` header followed by its decoded messages
/// and a blank separator.
pub fn to_plain(failed: &[FailedTest]) -> String {
    let mut out = String::new();
    for test in failed {
        out.push_str(&format!(
            "=== {} ===\n",
            test.title.as_deref().unwrap_or("(untitled)")
        ));
        for message in &test.failure_messages {
            out.push_str(message);
            out.push('\n');
        }
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FailedTest> {
        vec![
            FailedTest {
                title: Some("로그인".to_string()),
                failure_messages: vec!["line1\nline2".to_string()],
            },
            FailedTest {
                title: None,
                failure_messages: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_json_uses_requested_indent_and_keeps_unicode() {
        let rendered = to_json(&sample(), 4).unwrap();
        assert!(rendered.starts_with("[\n    {\n        \"title\": \"로그인\""));
        assert!(rendered.contains("\"failureMessages\""));
        assert!(rendered.contains("\"title\": null"));

        let parsed: Vec<FailedTest> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_plain_output_layout() {
        let rendered = to_plain(&sample());
        assert_eq!(
            rendered,
            "=== 로그인 ===\nline1\nline2\n\n\n=== (untitled) ===\n\n\n"
        );
    }

    #[test]
    fn test_empty_renderings() {
        assert_eq!(to_json(&[], 2).unwrap(), "[]");
        assert_eq!(to_plain(&[]), "");
    }
}
