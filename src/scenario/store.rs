//! File-backed scenario store

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::format::{check_scenario, SCENARIO_EXTENSION};
use crate::common::{Config, Error, Result};

/// Metadata about a stored scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioInfo {
    /// Scenario id (file name without the `.side` extension)
    pub side_id: String,
    /// File name on disk
    pub filename: String,
    /// Size in bytes
    pub size: u64,
}

/// Scenario store rooted at a single directory
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    root: PathBuf,
}

impl ScenarioStore {
    /// Create a store rooted at `root`
    ///
    /// The directory is created lazily on the first `put`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store for the configured scenarios directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.storage.scenarios_dir)
    }

    /// Directory holding the scenario files
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the slot for `side_id`
    ///
    /// The `.side` extension is appended unless the id already carries it.
    pub fn slot_path(&self, side_id: &str) -> Result<PathBuf> {
        let suffix = format!(".{SCENARIO_EXTENSION}");
        let stem = side_id.strip_suffix(suffix.as_str()).unwrap_or(side_id);
        if !is_plain_id(stem) {
            return Err(Error::InvalidScenarioId(side_id.to_string()));
        }
        Ok(self.root.join(format!("{stem}{suffix}")))
    }

    /// Store `bytes` as scenario `side_id`, replacing any previous content
    ///
    /// The content is validated first; an invalid document leaves the slot
    /// untouched.
    pub fn put(&self, side_id: &str, bytes: &[u8]) -> Result<ScenarioInfo> {
        let path = self.slot_path(side_id)?;
        check_scenario(bytes)?;

        std::fs::create_dir_all(&self.root)?;

        // Write to a sibling temp file and rename so readers never observe a
        // half-written scenario.
        let mut staged = tempfile::NamedTempFile::new_in(&self.root)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(side_id, path = %path.display(), size = bytes.len(), "Stored scenario");

        Ok(ScenarioInfo {
            side_id: file_stem(&path),
            filename: file_name(&path),
            size: bytes.len() as u64,
        })
    }

    /// Read the raw bytes of scenario `side_id`
    ///
    /// The stored content is re-validated; a slot corrupted since upload is
    /// reported as `InvalidFormat`.
    pub fn get(&self, side_id: &str) -> Result<Vec<u8>> {
        let path = self.slot_path(side_id)?;
        let bytes = read_slot(&path, side_id)?;
        check_scenario(&bytes)?;
        Ok(bytes)
    }

    /// Whether `side_id` currently holds a valid scenario
    pub fn validate(&self, side_id: &str) -> bool {
        match self.slot_path(side_id) {
            Ok(path) => valid_slot_size(&path).is_some(),
            Err(_) => false,
        }
    }

    /// Path of a stored, currently valid scenario
    ///
    /// Fails with `ScenarioNotFound` if the slot is absent and with
    /// `InvalidFormat` if it no longer validates.
    pub fn resolve(&self, side_id: &str) -> Result<PathBuf> {
        let path = self.slot_path(side_id)?;
        let bytes = read_slot(&path, side_id)?;
        check_scenario(&bytes)?;
        Ok(path)
    }

    /// List every valid scenario, sorted by id
    ///
    /// Files that fail validation are skipped silently.
    pub fn list(&self) -> Result<Vec<ScenarioInfo>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut scenarios = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            // A slot deleted after read_dir simply drops out here
            let Some(size) = valid_slot_size(&path) else {
                tracing::debug!(path = %path.display(), "Skipping invalid scenario file");
                continue;
            };
            scenarios.push(ScenarioInfo {
                side_id: file_stem(&path),
                filename: file_name(&path),
                size,
            });
        }

        scenarios.sort_by(|a, b| a.side_id.cmp(&b.side_id));
        Ok(scenarios)
    }

    /// Remove scenario `side_id`
    pub fn delete(&self, side_id: &str) -> Result<()> {
        let path = self.slot_path(side_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(side_id, "Deleted scenario");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::ScenarioNotFound(side_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether `stem` names a single file inside the store directory
fn is_plain_id(stem: &str) -> bool {
    !stem.is_empty() && stem != "." && stem != ".." && !stem.contains(['/', '\\', '\0'])
}

fn read_slot(path: &Path, side_id: &str) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(Error::ScenarioNotFound(side_id.to_string()));
    }
    std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::ScenarioNotFound(side_id.to_string()),
        _ => Error::file_read(path, &e),
    })
}

/// Size of the slot at `path` if it holds a valid scenario
///
/// The size comes from the same read that validated the content.
fn valid_slot_size(path: &Path) -> Option<u64> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(SCENARIO_EXTENSION) {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    check_scenario(&bytes).ok()?;
    Some(bytes.len() as u64)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
