//! Pending change records stored under the changeset directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::release::BumpType;
use crate::vcs::VersionControl;

/// Default changeset directory, relative to the workspace root.
pub const CHANGESET_DIR: &str = ".changeset";
/// Structured metadata file inside each record directory.
pub const METADATA_FILE: &str = "changes.json";
/// Free-text summary file inside each record directory.
pub const SUMMARY_FILE: &str = "changes.md";

/// One `{name, type}` entry of a change record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRelease {
    pub name: String,
    #[serde(rename = "type")]
    pub bump: BumpType,
}

#[derive(Debug, Deserialize)]
struct ChangeMetadata {
    releases: Vec<ChangeRelease>,
}

/// A recorded unit of release intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub id: String,
    pub releases: Vec<ChangeRelease>,
    pub summary: String,
    /// Revision that first added the record, when it has been committed.
    pub introduced_at: Option<String>,
}

impl ChangeRecord {
    pub fn new(id: impl Into<String>, releases: Vec<ChangeRelease>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            releases,
            summary: summary.into(),
            introduced_at: None,
        }
    }
}

/// Reads and clears change records under a base directory.
pub struct ChangeRecordStore {
    base: PathBuf,
}

impl ChangeRecordStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Store rooted at `<workspace_root>/.changeset`.
    pub fn for_workspace(workspace_root: impl AsRef<Path>) -> Self {
        Self::new(workspace_root.as_ref().join(CHANGESET_DIR))
    }

    #[inline]
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Loads every pending change record, sorted by id.
    ///
    /// Empty subdirectories left behind by an interrupted run are removed
    /// first. Plain files directly under the base directory are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the base directory does not exist,
    /// and [`Error::MalformedRecord`] if any record lacks a readable summary
    /// or a parsable metadata file.
    pub fn load_pending(&self, vcs: &dyn VersionControl) -> Result<Vec<ChangeRecord>> {
        if !self.base.is_dir() {
            return Err(Error::Configuration(format!(
                "There is no changeset directory in this project (expected {})",
                self.base.display()
            )));
        }

        self.remove_empty_dirs()?;

        let mut records = Vec::new();
        for entry in fs::read_dir(&self.base).map_err(|e| Error::io_at(&self.base, e))? {
            let entry = entry.map_err(|e| Error::io_at(&self.base, e))?;
            let path = entry.path();
            if !entry.file_type().map_err(|e| Error::io_at(&path, e))?.is_dir() {
                continue;
            }

            let mut record = Self::read_record(&path)?;
            record.introduced_at = match vcs.find_introducing_revision(&path.join(METADATA_FILE)) {
                Ok(revision) => revision,
                Err(e) => {
                    warn!(record = %record.id, error = %e, "could not resolve introducing revision");
                    None
                }
            };
            debug!(record = %record.id, releases = record.releases.len(), "loaded change record");
            records.push(record);
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// Removes every record directory, leaving the base directory in place.
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.base).map_err(|e| Error::io_at(&self.base, e))? {
            let entry = entry.map_err(|e| Error::io_at(&self.base, e))?;
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path).map_err(|e| Error::io_at(&path, e))?;
                debug!(dir = %path.display(), "removed change record");
            }
        }
        Ok(())
    }

    fn remove_empty_dirs(&self) -> Result<()> {
        for entry in fs::read_dir(&self.base).map_err(|e| Error::io_at(&self.base, e))? {
            let path = entry.map_err(|e| Error::io_at(&self.base, e))?.path();
            if path.is_dir() && is_empty_tree(&path)? {
                fs::remove_dir_all(&path).map_err(|e| Error::io_at(&path, e))?;
                debug!(dir = %path.display(), "removed empty change record directory");
            }
        }
        Ok(())
    }

    fn read_record(dir: &Path) -> Result<ChangeRecord> {
        let malformed = |reason: String| Error::MalformedRecord {
            dir: dir.to_path_buf(),
            reason,
        };

        let id = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| malformed("directory name is not valid UTF-8".to_string()))?
            .to_string();

        let summary = fs::read_to_string(dir.join(SUMMARY_FILE))
            .map_err(|e| malformed(format!("cannot read {}: {}", SUMMARY_FILE, e)))?;
        let metadata = fs::read_to_string(dir.join(METADATA_FILE))
            .map_err(|e| malformed(format!("cannot read {}: {}", METADATA_FILE, e)))?;
        let metadata: ChangeMetadata = serde_json::from_str(&metadata)
            .map_err(|e| malformed(format!("cannot parse {}: {}", METADATA_FILE, e)))?;

        let mut seen = Vec::with_capacity(metadata.releases.len());
        for release in &metadata.releases {
            if seen.contains(&release.name.as_str()) {
                return Err(malformed(format!("package '{}' is listed twice", release.name)));
            }
            seen.push(release.name.as_str());
        }

        Ok(ChangeRecord {
            id,
            releases: metadata.releases,
            summary: summary.trim().to_string(),
            introduced_at: None,
        })
    }
}

/// True when `dir` contains nothing but (recursively) empty directories.
fn is_empty_tree(dir: &Path) -> Result<bool> {
    for entry in fs::read_dir(dir).map_err(|e| Error::io_at(dir, e))? {
        let path = entry.map_err(|e| Error::io_at(dir, e))?.path();
        if !path.is_dir() || !is_empty_tree(&path)? {
            return Ok(false);
        }
    }
    Ok(true)
}
