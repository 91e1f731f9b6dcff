use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use bumpkit_core::adapter::ManifestAdapter;
use bumpkit_core::applier::{ReleaseApplier, ReleaseOutcome};
use bumpkit_core::changelog::{MarkdownChangelog, CHANGELOG_FILE};
use bumpkit_core::changeset::{ChangeRecordStore, METADATA_FILE, SUMMARY_FILE};
use bumpkit_core::config::ReleaseConfig;
use bumpkit_core::package::{ManifestKind, PackageInfo};
use bumpkit_core::release_reporter::SilentReporter;
use bumpkit_core::vcs::{GitCli, VersionControl};
use bumpkit_core::Result;
use semver::Version;
use tempfile::TempDir;

/// `version=` line manifests; dependencies are not tracked.
struct VersionLineAdapter;

impl ManifestAdapter for VersionLineAdapter {
    fn kind(&self) -> ManifestKind {
        ManifestKind::Js
    }

    fn read_package(&self, _dir: &Path) -> Result<Option<PackageInfo>> {
        Ok(None)
    }

    fn set_version(&self, _path: &Path, content: &str, version: &Version) -> Result<String> {
        Ok(content
            .lines()
            .map(|line| match line.strip_prefix("version=") {
                Some(_) => format!("version={}\n", version),
                None => format!("{}\n", line),
            })
            .collect())
    }

    fn set_dependency_versions(
        &self,
        _path: &Path,
        content: &str,
        _versions: &BTreeMap<&str, &Version>,
    ) -> Result<String> {
        Ok(content.to_string())
    }
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git").current_dir(dir).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

struct Repo {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Repo {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        git(&root, &["init", "--quiet"]);
        git(&root, &["config", "user.name", "Release Bot"]);
        git(&root, &["config", "user.email", "release-bot@example.com"]);
        git(&root, &["config", "commit.gpgsign", "false"]);
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn commit_all(&self, message: &str) -> String {
        git(&self.root, &["add", "--all"]);
        git(&self.root, &["commit", "--quiet", "-m", message]);
        git(&self.root, &["rev-parse", "HEAD"])
    }
}

#[test]
fn test_introducing_revision_is_the_adding_commit() {
    let repo = Repo::new();
    repo.write(".changeset/brave-cat/changes.json", r#"{"releases": []}"#);
    repo.write(".changeset/brave-cat/changes.md", "First");
    let added = repo.commit_all("add record");
    repo.write(".changeset/brave-cat/changes.md", "First, reworded");
    let edited = repo.commit_all("edit record");
    assert_ne!(added, edited);

    let vcs = GitCli::new(&repo.root);
    let metadata = repo.root.join(".changeset/brave-cat").join(METADATA_FILE);
    assert_eq!(vcs.find_introducing_revision(&metadata).unwrap(), Some(added.clone()));

    repo.write(".changeset/shy-elk/changes.json", r#"{"releases": []}"#);
    repo.write(".changeset/shy-elk/changes.md", "Not committed yet");
    let uncommitted = repo.root.join(".changeset/shy-elk").join(METADATA_FILE);
    assert_eq!(vcs.find_introducing_revision(&uncommitted).unwrap(), None);

    let records = ChangeRecordStore::for_workspace(&repo.root).load_pending(&vcs).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].introduced_at.as_deref(), Some(added.as_str()));
    assert_eq!(records[1].introduced_at, None);
}

#[test]
fn test_release_commit_leaves_clean_tree() {
    let repo = Repo::new();
    repo.write("packages/b/package.json", "name=b\nversion=1.2.0\n");
    repo.write(
        &format!(".changeset/r1/{}", METADATA_FILE),
        r#"{"releases": [{"name": "b", "type": "minor"}]}"#,
    );
    repo.write(&format!(".changeset/r1/{}", SUMMARY_FILE), "Add widgets");
    let added = repo.commit_all("initial");

    let packages = vec![PackageInfo::new(
        "b",
        ManifestKind::Js,
        repo.root.join("packages/b"),
        Version::new(1, 2, 0),
    )];
    let config = ReleaseConfig {
        commit: true,
        skip_ci: true,
        no_changelog: false,
        cwd: repo.root.clone(),
    };
    let applier = ReleaseApplier::new(
        config,
        GitCli::new(&repo.root),
        MarkdownChangelog,
        |_kind: ManifestKind| -> Box<dyn ManifestAdapter> { Box::new(VersionLineAdapter) },
        SilentReporter,
    );

    let outcome = applier.run(&packages).unwrap();
    assert!(matches!(outcome, ReleaseOutcome::Completed(ref summary) if summary.committed));

    assert_eq!(
        git(&repo.root, &["log", "-1", "--format=%B"]),
        "RELEASING: Releasing 1 package(s)\n\nReleases:\n  b@1.3.0\n\n[skip ci]"
    );
    assert_eq!(git(&repo.root, &["status", "--porcelain"]), "");
    assert_eq!(git(&repo.root, &["ls-files", ".changeset"]), "");
    assert_eq!(
        git(&repo.root, &["show", "HEAD:packages/b/package.json"]),
        "name=b\nversion=1.3.0"
    );

    let changelog = git(&repo.root, &["show", &format!("HEAD:packages/b/{}", CHANGELOG_FILE)]);
    assert!(changelog.contains(&format!("- {} Add widgets", &added[..7])));
}
