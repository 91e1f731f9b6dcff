//! Semantic versioning and release planning.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::changeset::ChangeRecord;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::package::PackageInfo;

/// Contributing record id attached to bumps caused only by a dependency.
pub const CASCADE_MARKER: &str = "cascade";

/// Type of semantic version bump, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// Patch version bump (1.0.0 -> 1.0.1).
    Patch,
    /// Minor version bump (1.0.0 -> 1.1.0).
    Minor,
    /// Major version bump (1.0.0 -> 2.0.0).
    Major,
}

impl BumpType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::Patch => "patch",
            BumpType::Minor => "minor",
            BumpType::Major => "major",
        }
    }

    /// Returns the next version after applying this bump to `version`.
    ///
    /// Pre-release and build metadata are dropped.
    pub fn apply(&self, version: &Version) -> Version {
        match self {
            BumpType::Major => Version::new(version.major + 1, 0, 0),
            BumpType::Minor => Version::new(version.major, version.minor + 1, 0),
            BumpType::Patch => Version::new(version.major, version.minor, version.patch + 1),
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package that will be version-bumped as part of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRelease {
    pub name: String,
    pub old_version: Version,
    pub new_version: Version,
    pub bump: BumpType,
    /// Ids of the change records that asked for this bump, or [`CASCADE_MARKER`].
    pub contributing_records: Vec<String>,
}

impl PlannedRelease {
    /// True when no change record named this package directly.
    pub fn is_cascade(&self) -> bool {
        self.contributing_records.iter().all(|id| id == CASCADE_MARKER)
    }
}

/// The computed version plan for one release run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleasePlan {
    pub releases: BTreeMap<String, PlannedRelease>,
}

impl ReleasePlan {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&PlannedRelease> {
        self.releases.get(name)
    }

    /// Package name to new version, for rewriting dependency constraints.
    pub fn new_versions(&self) -> BTreeMap<&str, &Version> {
        self.releases
            .iter()
            .map(|(name, release)| (name.as_str(), &release.new_version))
            .collect()
    }

    pub fn direct(&self) -> impl Iterator<Item = &PlannedRelease> {
        self.releases.values().filter(|r| !r.is_cascade())
    }

    pub fn cascaded(&self) -> impl Iterator<Item = &PlannedRelease> {
        self.releases.values().filter(|r| r.is_cascade())
    }
}

/// Aggregates change records into a [`ReleasePlan`].
pub struct ReleasePlanner;

impl ReleasePlanner {
    /// Plans a release from every pending change record.
    ///
    /// Each package gets the highest bump any record asks for, applied once.
    /// Dependents of released packages then receive patch bumps until a fixed
    /// point is reached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPackage`] if a record names a package that is
    /// not part of the workspace.
    pub fn plan(records: &[ChangeRecord], packages: &[PackageInfo]) -> Result<ReleasePlan> {
        let by_name: HashMap<&str, &PackageInfo> =
            packages.iter().map(|p| (p.name.as_str(), p)).collect();

        let mut requested: BTreeMap<&str, (BumpType, Vec<String>)> = BTreeMap::new();
        for record in records {
            for release in &record.releases {
                if !by_name.contains_key(release.name.as_str()) {
                    let mut available: Vec<&str> = by_name.keys().copied().collect();
                    available.sort_unstable();
                    return Err(Error::UnknownPackage {
                        name: release.name.clone(),
                        record: record.id.clone(),
                        available: available.join(", "),
                    });
                }

                let entry = requested
                    .entry(release.name.as_str())
                    .or_insert((release.bump, Vec::new()));
                entry.0 = entry.0.max(release.bump);
                entry.1.push(record.id.clone());
            }
        }

        let mut plan = ReleasePlan::default();
        for (name, (bump, mut contributing)) in requested {
            let package = by_name[name];
            contributing.sort();
            contributing.dedup();
            debug!(package = name, %bump, records = contributing.len(), "planned direct release");
            plan.releases.insert(
                name.to_string(),
                PlannedRelease {
                    name: name.to_string(),
                    old_version: package.version.clone(),
                    new_version: bump.apply(&package.version),
                    bump,
                    contributing_records: contributing,
                },
            );
        }

        Self::cascade(&mut plan, packages);
        Ok(plan)
    }

    /// Adds patch bumps for every package depending on a planned package.
    ///
    /// Iterates until a full scan adds nothing, so running it on an already
    /// cascaded plan is a no-op. Returns the number of entries added.
    pub fn cascade(plan: &mut ReleasePlan, packages: &[PackageInfo]) -> usize {
        let graph = DependencyGraph::new(packages);
        let by_name: HashMap<&str, &PackageInfo> =
            packages.iter().map(|p| (p.name.as_str(), p)).collect();
        let mut added = 0;

        loop {
            let mut pending: Vec<&str> = Vec::new();
            for planned in plan.releases.keys() {
                for dependent in graph.dependents(planned) {
                    if !plan.releases.contains_key(dependent) && !pending.contains(&dependent) {
                        pending.push(dependent);
                    }
                }
            }

            if pending.is_empty() {
                break;
            }

            for name in pending {
                let package = by_name[name];
                debug!(package = name, "planned cascade release");
                plan.releases.insert(
                    name.to_string(),
                    PlannedRelease {
                        name: name.to_string(),
                        old_version: package.version.clone(),
                        new_version: BumpType::Patch.apply(&package.version),
                        bump: BumpType::Patch,
                        contributing_records: vec![CASCADE_MARKER.to_string()],
                    },
                );
                added += 1;
            }
        }

        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_type_ordering() {
        assert!(BumpType::Major > BumpType::Minor);
        assert!(BumpType::Minor > BumpType::Patch);
        assert_eq!(BumpType::Patch.max(BumpType::Major), BumpType::Major);
    }

    #[test]
    fn test_bump_apply_resets_lower_components() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(BumpType::Major.apply(&v), Version::new(2, 0, 0));
        assert_eq!(BumpType::Minor.apply(&v), Version::new(1, 3, 0));
        assert_eq!(BumpType::Patch.apply(&v), Version::new(1, 2, 4));
    }

    #[test]
    fn test_bump_apply_drops_prerelease() {
        let v = Version::parse("1.2.3-beta.1").unwrap();
        assert_eq!(BumpType::Patch.apply(&v), Version::new(1, 2, 4));
    }
}
