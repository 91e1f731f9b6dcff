//! Command implementations for the CLI.

mod release_reporter;
mod status;
mod version;

use anyhow::Result;
use bumpkit_adapters::all_adapters;
use bumpkit_core::graph::DependencyGraph;
use bumpkit_core::package::PackageInfo;
use bumpkit_core::release::{PlannedRelease, ReleasePlan};
use bumpkit_core::Scanner;
use std::path::Path;

pub use status::cmd_status;
pub use version::cmd_version;

fn scan_workspace(root: &Path) -> Result<Vec<PackageInfo>> {
    let packages = Scanner::new(root, all_adapters()).scan()?;
    tracing::debug!(count = packages.len(), "discovered packages");
    Ok(packages)
}

/// Plan entries with each package listed after the packages it depends on.
fn ordered_releases<'a>(plan: &'a ReleasePlan, packages: &[PackageInfo]) -> Vec<&'a PlannedRelease> {
    DependencyGraph::new(packages)
        .dependencies_first()
        .into_iter()
        .filter_map(|name| plan.get(name))
        .collect()
}
