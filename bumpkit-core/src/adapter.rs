//! Manifest adapter trait for reading and rewriting package manifests.

use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;

use crate::error::Result;
use crate::package::{ManifestKind, PackageInfo};

/// Trait for format-specific manifest operations.
///
/// Adapters detect packages and read their metadata. Rewrites are pure
/// string transforms so the caller owns every filesystem write; they must
/// leave everything except the targeted values byte-identical.
pub trait ManifestAdapter: Send + Sync {
    fn kind(&self) -> ManifestKind;

    fn detect(&self, dir: &Path) -> bool {
        dir.join(self.kind().file_name()).is_file()
    }

    /// Reads the package in `dir`.
    ///
    /// Returns `Ok(None)` for manifests that do not describe a releasable
    /// package (for example a virtual workspace root).
    fn read_package(&self, dir: &Path) -> Result<Option<PackageInfo>>;

    /// Returns `content` with the package version set to `version`.
    fn set_version(&self, path: &Path, content: &str, version: &Version) -> Result<String>;

    /// Returns `content` with the constraints on each named dependency moved
    /// to the given version, keeping each constraint's operator.
    fn set_dependency_versions(
        &self,
        path: &Path,
        content: &str,
        versions: &BTreeMap<&str, &Version>,
    ) -> Result<String>;

    /// Returns the workspace root manifest `content` with its shared
    /// dependency declarations moved to the given versions.
    ///
    /// Formats without shared declarations return `content` unchanged.
    fn set_workspace_dependency_versions(
        &self,
        _path: &Path,
        content: &str,
        _versions: &BTreeMap<&str, &Version>,
    ) -> Result<String> {
        Ok(content.to_string())
    }
}

pub type AdapterGetter = dyn Fn(ManifestKind) -> Box<dyn ManifestAdapter> + Send + Sync;
