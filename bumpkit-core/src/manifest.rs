//! Applies a release plan to package manifests.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use semver::Version;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::adapter::AdapterGetter;
use crate::error::{Error, Result};
use crate::package::{ManifestKind, PackageInfo};
use crate::release::ReleasePlan;

/// Writes plan versions into manifests.
///
/// Pass one sets each released package's own version; pass two moves every
/// intra-workspace constraint on a released package to its new version;
/// pass three does the same for shared declarations in the workspace root
/// manifests. Nothing is rolled back on failure.
pub struct ManifestMutator<'a> {
    adapters: &'a AdapterGetter,
    workspace_root: &'a Path,
}

impl<'a> ManifestMutator<'a> {
    pub fn new(adapters: &'a AdapterGetter, workspace_root: &'a Path) -> Self {
        Self {
            adapters,
            workspace_root,
        }
    }

    /// Applies `plan` and returns the manifests written, in write order.
    ///
    /// `on_write` runs right after each manifest is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartialApply`] carrying the files already written
    /// when a read, rewrite, write or `on_write` call fails.
    pub fn apply(
        &self,
        plan: &ReleasePlan,
        packages: &[PackageInfo],
        on_write: &mut dyn FnMut(&Path) -> Result<()>,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        match self.apply_inner(plan, packages, on_write, &mut written) {
            Ok(()) => Ok(written),
            Err(source) => Err(Error::PartialApply {
                written,
                source: Box::new(source),
            }),
        }
    }

    fn apply_inner(
        &self,
        plan: &ReleasePlan,
        packages: &[PackageInfo],
        on_write: &mut dyn FnMut(&Path) -> Result<()>,
        written: &mut Vec<PathBuf>,
    ) -> Result<()> {
        for release in plan.releases.values() {
            let package = packages
                .iter()
                .find(|p| p.name == release.name)
                .ok_or_else(|| Error::Release(format!("Package {} is not in the workspace", release.name)))?;

            let adapter = (self.adapters)(package.kind);
            let path = package.manifest_path();
            let new_version = &release.new_version;
            self.rewrite(&path, |content| adapter.set_version(&path, content, new_version), on_write, written)?;
            info!(package = %package.name, version = %new_version, "bumped manifest version");
        }

        let new_versions = plan.new_versions();
        for package in packages {
            let updates: BTreeMap<&str, &Version> = package
                .dependencies
                .keys()
                .filter_map(|dep| new_versions.get_key_value(dep.as_str()).map(|(k, v)| (*k, *v)))
                .collect();
            if updates.is_empty() {
                continue;
            }

            let adapter = (self.adapters)(package.kind);
            let path = package.manifest_path();
            self.rewrite(
                &path,
                |content| adapter.set_dependency_versions(&path, content, &updates),
                on_write,
                written,
            )?;
            debug!(package = %package.name, dependencies = updates.len(), "updated dependency constraints");
        }

        for kind in ManifestKind::ALL {
            let path = self.workspace_root.join(kind.file_name());
            if !path.is_file() {
                continue;
            }
            let adapter = (self.adapters)(kind);
            self.rewrite(
                &path,
                |content| adapter.set_workspace_dependency_versions(&path, content, &new_versions),
                on_write,
                written,
            )?;
        }

        Ok(())
    }

    fn rewrite(
        &self,
        path: &Path,
        transform: impl FnOnce(&str) -> Result<String>,
        on_write: &mut dyn FnMut(&Path) -> Result<()>,
        written: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let updated = transform(&content)?;
        if updated == content {
            return Ok(());
        }

        write_atomic(path, &updated)?;
        if !written.iter().any(|p| p == path) {
            written.push(path.to_path_buf());
        }
        on_write(path)
    }
}

/// Replaces `path` with `content` via a temporary file in the same directory,
/// so the file is either fully updated or left as it was.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io_at(dir, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| Error::io_at(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io_at(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "old\n").unwrap();

        write_atomic(&path, "new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_missing_dir_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("package.json");

        assert!(write_atomic(&path, "{}").is_err());
        assert!(!path.exists());
    }
}
