//! Changelog generation for released packages.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::changeset::ChangeRecord;
use crate::error::{Error, Result};
use crate::manifest::write_atomic;
use crate::package::PackageInfo;
use crate::release::{PlannedRelease, ReleasePlan};

pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Renders and writes changelog entries for a release plan.
pub trait ChangelogWriter {
    /// Writes one entry per released package.
    ///
    /// `on_write` runs after each file is written. On failure the error is
    /// an [`Error::PartialApply`] listing the files already written.
    fn update(
        &self,
        plan: &ReleasePlan,
        records: &[ChangeRecord],
        packages: &[PackageInfo],
        on_write: &mut dyn FnMut(&Path) -> Result<()>,
    ) -> Result<Vec<PathBuf>>;
}

/// Prepends a markdown section to `CHANGELOG.md` in each package directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownChangelog;

impl MarkdownChangelog {
    /// Renders the section for one release, without a trailing blank line.
    pub fn render_entry(
        release: &PlannedRelease,
        records: &HashMap<&str, &ChangeRecord>,
        package: &PackageInfo,
        plan: &ReleasePlan,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "## {}", release.new_version);
        out.push('\n');

        for id in &release.contributing_records {
            let Some(record) = records.get(id.as_str()) else {
                continue;
            };
            let prefix = match &record.introduced_at {
                Some(rev) => format!("{} ", rev.chars().take(7).collect::<String>()),
                None => String::new(),
            };
            let mut lines = record.summary.lines();
            let first = lines.next().unwrap_or_default();
            let _ = writeln!(out, "- {}{}", prefix, first);
            for line in lines {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, "  {}", line);
                }
            }
        }

        let updated: Vec<String> = package
            .dependencies
            .keys()
            .filter_map(|dep| plan.get(dep))
            .map(|dep| format!("{}@{}", dep.name, dep.new_version))
            .collect();
        if !updated.is_empty() {
            let _ = writeln!(out, "- Updated dependencies: {}", updated.join(", "));
        }

        out
    }

    fn prepend(existing: &str, name: &str, entry: &str) -> String {
        let (title, rest) = match existing.split_once('\n') {
            Some((title, rest)) if title.starts_with("# ") => {
                (title.to_string(), rest.trim_start_matches('\n'))
            }
            None if existing.starts_with("# ") => (existing.trim_end().to_string(), ""),
            _ => (format!("# {}", name), existing),
        };

        if rest.trim().is_empty() {
            format!("{}\n\n{}", title, entry)
        } else {
            format!("{}\n\n{}\n{}", title, entry, rest)
        }
    }
}

impl ChangelogWriter for MarkdownChangelog {
    fn update(
        &self,
        plan: &ReleasePlan,
        records: &[ChangeRecord],
        packages: &[PackageInfo],
        on_write: &mut dyn FnMut(&Path) -> Result<()>,
    ) -> Result<Vec<PathBuf>> {
        let by_id: HashMap<&str, &ChangeRecord> = records.iter().map(|r| (r.id.as_str(), r)).collect();
        let mut written = Vec::new();

        for release in plan.releases.values() {
            let Some(package) = packages.iter().find(|p| p.name == release.name) else {
                continue;
            };
            let path = package.dir.join(CHANGELOG_FILE);

            let result = (|| {
                let existing = match fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
                    Err(e) => return Err(Error::io_at(&path, e)),
                };
                let entry = Self::render_entry(release, &by_id, package, plan);
                write_atomic(&path, &Self::prepend(&existing, &package.name, &entry))
            })();

            if let Err(source) = result {
                return Err(Error::PartialApply {
                    written,
                    source: Box::new(source),
                });
            }
            written.push(path.clone());
            info!(package = %package.name, "updated changelog");

            if let Err(source) = on_write(&path) {
                return Err(Error::PartialApply {
                    written,
                    source: Box::new(source),
                });
            }
        }

        Ok(written)
    }
}
