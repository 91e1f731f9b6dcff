//! Workspace scanner for discovering packages.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::adapter::ManifestAdapter;
use crate::error::{Error, Result};
use crate::package::PackageInfo;

const MAX_DEPTH: usize = 3;
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

/// Scans a workspace for package manifests.
///
/// Each directory is offered to every adapter; the adapters that recognise
/// a manifest there contribute a package.
pub struct Scanner {
    root: PathBuf,
    adapters: Vec<Box<dyn ManifestAdapter>>,
}

impl Scanner {
    pub fn new(root: impl AsRef<Path>, adapters: Vec<Box<dyn ManifestAdapter>>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            adapters,
        }
    }

    /// Returns every package, sorted by name, with dependencies narrowed to
    /// other workspace packages.
    ///
    /// # Errors
    ///
    /// Fails if a manifest cannot be read or two packages share a name.
    pub fn scan(&self) -> Result<Vec<PackageInfo>> {
        let dirs: Vec<PathBuf> = WalkDir::new(&self.root)
            .max_depth(MAX_DEPTH)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        let found: Result<Vec<Vec<PackageInfo>>> = dirs
            .par_iter()
            .map(|dir| {
                let mut packages = Vec::new();
                for adapter in &self.adapters {
                    if adapter.detect(dir) {
                        if let Some(package) = adapter.read_package(dir)? {
                            packages.push(package);
                        }
                    }
                }
                Ok(packages)
            })
            .collect();

        let mut packages: Vec<PackageInfo> = found?.into_iter().flatten().collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));

        let mut names = HashSet::new();
        for package in &packages {
            if !names.insert(package.name.clone()) {
                return Err(Error::Configuration(format!(
                    "Package name '{}' is declared more than once in the workspace",
                    package.name
                )));
            }
        }

        for package in &mut packages {
            let own = package.name.clone();
            package
                .dependencies
                .retain(|dep, _| dep != &own && names.contains(dep));
        }

        debug!(count = packages.len(), root = %self.root.display(), "scanned workspace");
        Ok(packages)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}
