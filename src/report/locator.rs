//! Locating the newest report artifact in an output directory

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::common::{Error, Result};

/// File name pattern of the form `prefix*suffix`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPattern {
    prefix: String,
    suffix: String,
}

impl ReportPattern {
    /// Parse a pattern containing exactly one `*` wildcard
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut parts = pattern.split('*');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            _ => Err(Error::Config(format!(
                "report pattern '{pattern}' must contain exactly one '*'"
            ))),
        }
    }

    /// Whether `name` matches this pattern
    pub fn matches(&self, name: &str) -> bool {
        name.len() >= self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }
}

impl Default for ReportPattern {
    fn default() -> Self {
        Self {
            prefix: "results-".to_string(),
            suffix: ".json".to_string(),
        }
    }
}

/// Find the most recently modified file in `directory` matching `pattern`
///
/// Returns `None` when nothing matches or the directory does not exist.
/// When two files share a modification time the lexicographically greater
/// file name wins. Entries that vanish while scanning are ignored.
pub fn latest(directory: &Path, pattern: &ReportPattern) -> Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut best: Option<(SystemTime, String, PathBuf)> = None;

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !pattern.matches(&name) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;

        let newer = match &best {
            None => true,
            Some((best_time, best_name, _)) => (modified, &name) > (*best_time, best_name),
        };
        if newer {
            best = Some((modified, name, entry.path()));
        }
    }

    Ok(best.map(|(_, _, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "{}").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    #[test]
    fn test_pattern_parse_and_match() {
        let pattern = ReportPattern::parse("results-*.json").unwrap();
        assert_eq!(pattern, ReportPattern::default());
        assert!(pattern.matches("results-2024-01-01T10-00-00.json"));
        assert!(pattern.matches("results-.json"));
        assert!(!pattern.matches("results.json"));
        assert!(!pattern.matches("results-1.json.bak"));
        assert!(!pattern.matches("junit-1.xml"));

        assert!(ReportPattern::parse("results.json").is_err());
        assert!(ReportPattern::parse("*-*.json").is_err());
    }

    #[test]
    fn test_latest_picks_greatest_mtime() {
        let dir = tempfile::tempdir().unwrap();
        // Names deliberately sort opposite to their modification times
        touch(dir.path(), "results-c.json", 300);
        let newest = touch(dir.path(), "results-a.json", 10);
        touch(dir.path(), "results-b.json", 100);
        touch(dir.path(), "other-z.json", 0);

        let found = latest(dir.path(), &ReportPattern::default()).unwrap();
        assert_eq!(found, Some(newest));
    }

    #[test]
    fn test_equal_mtime_prefers_greater_name() {
        let dir = tempfile::tempdir().unwrap();
        let when = SystemTime::now() - Duration::from_secs(60);
        for name in ["results-1.json", "results-2.json"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "{}").unwrap();
            File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(when)
                .unwrap();
        }

        let found = latest(dir.path(), &ReportPattern::default()).unwrap();
        assert_eq!(found, Some(dir.path().join("results-2.json")));
    }

    #[test]
    fn test_empty_or_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest(dir.path(), &ReportPattern::default()).unwrap(), None);
        assert_eq!(
            latest(&dir.path().join("missing"), &ReportPattern::default()).unwrap(),
            None
        );
    }

    #[test]
    fn test_matching_directories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("results-dir.json")).unwrap();
        assert_eq!(latest(dir.path(), &ReportPattern::default()).unwrap(), None);
    }
}
