use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use bumpkit_core::changeset::{ChangeRecordStore, METADATA_FILE, SUMMARY_FILE};
use bumpkit_core::release::BumpType;
use bumpkit_core::vcs::VersionControl;
use bumpkit_core::{Error, Result};
use tempfile::TempDir;

#[derive(Default)]
struct LookupOnlyVcs {
    revision: Option<String>,
    fail: bool,
    lookups: RefCell<Vec<PathBuf>>,
}

impl VersionControl for LookupOnlyVcs {
    fn stage(&self, _path: &Path) -> Result<()> {
        panic!("loading records must not stage");
    }

    fn commit(&self, _message: &str) -> Result<()> {
        panic!("loading records must not commit");
    }

    fn find_introducing_revision(&self, path: &Path) -> Result<Option<String>> {
        self.lookups.borrow_mut().push(path.to_path_buf());
        if self.fail {
            return Err(Error::vcs("not a git repository"));
        }
        Ok(self.revision.clone())
    }
}

fn write_record(base: &Path, id: &str, json: &str, summary: &str) {
    let dir = base.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(METADATA_FILE), json).unwrap();
    fs::write(dir.join(SUMMARY_FILE), summary).unwrap();
}

#[test]
fn test_missing_base_is_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = ChangeRecordStore::for_workspace(temp_dir.path());

    let err = store.load_pending(&LookupOnlyVcs::default()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_loads_records_sorted_with_revisions() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join(".changeset");
    write_record(
        &base,
        "zesty-owl",
        r#"{"releases": [{"name": "pkg-b", "type": "minor"}], "dependents": []}"#,
        "Add a feature\n",
    );
    write_record(
        &base,
        "angry-fox",
        r#"{"releases": [{"name": "pkg-a", "type": "patch"}, {"name": "pkg-b", "type": "major"}]}"#,
        "Fix a bug",
    );
    fs::write(base.join("README.md"), "not a record").unwrap();

    let vcs = LookupOnlyVcs {
        revision: Some("abc1234def".to_string()),
        ..Default::default()
    };
    let records = ChangeRecordStore::new(&base).load_pending(&vcs).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "angry-fox");
    assert_eq!(records[0].releases.len(), 2);
    assert_eq!(records[0].releases[1].bump, BumpType::Major);
    assert_eq!(records[1].id, "zesty-owl");
    assert_eq!(records[1].summary, "Add a feature");
    assert_eq!(records[1].introduced_at.as_deref(), Some("abc1234def"));
    assert!(vcs
        .lookups
        .borrow()
        .iter()
        .all(|p| p.file_name().unwrap() == METADATA_FILE));
}

#[test]
fn test_revision_lookup_failure_is_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join(".changeset");
    write_record(&base, "r1", r#"{"releases": [{"name": "a", "type": "patch"}]}"#, "x");

    let vcs = LookupOnlyVcs {
        fail: true,
        ..Default::default()
    };
    let records = ChangeRecordStore::new(&base).load_pending(&vcs).unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].introduced_at.is_none());
}

#[test]
fn test_empty_directories_are_removed() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join(".changeset");
    fs::create_dir_all(base.join("stale").join("nested")).unwrap();
    write_record(&base, "r1", r#"{"releases": [{"name": "a", "type": "patch"}]}"#, "x");

    let records = ChangeRecordStore::new(&base)
        .load_pending(&LookupOnlyVcs::default())
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(!base.join("stale").exists());
}

#[test]
fn test_missing_summary_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join(".changeset");
    let dir = base.join("broken");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(METADATA_FILE), r#"{"releases": []}"#).unwrap();
    write_record(&base, "fine", r#"{"releases": [{"name": "a", "type": "patch"}]}"#, "x");

    let err = ChangeRecordStore::new(&base)
        .load_pending(&LookupOnlyVcs::default())
        .unwrap_err();

    match err {
        Error::MalformedRecord { dir: bad, .. } => assert_eq!(bad, dir),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unparsable_metadata_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join(".changeset");
    write_record(&base, "bad-json", r#"{"releases": [{"name": "a", "type": "huge"}]}"#, "x");

    let err = ChangeRecordStore::new(&base)
        .load_pending(&LookupOnlyVcs::default())
        .unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { .. }));
}

#[test]
fn test_duplicate_package_in_record_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join(".changeset");
    write_record(
        &base,
        "dup",
        r#"{"releases": [{"name": "a", "type": "patch"}, {"name": "a", "type": "minor"}]}"#,
        "x",
    );

    let err = ChangeRecordStore::new(&base)
        .load_pending(&LookupOnlyVcs::default())
        .unwrap_err();
    assert!(matches!(err, Error::MalformedRecord { .. }));
}

#[test]
fn test_clear_removes_record_directories_only() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join(".changeset");
    write_record(&base, "r1", r#"{"releases": []}"#, "x");
    write_record(&base, "r2", r#"{"releases": []}"#, "y");
    fs::write(base.join("config.json"), "{}").unwrap();

    ChangeRecordStore::new(&base).clear().unwrap();

    assert!(base.is_dir());
    assert!(base.join("config.json").exists());
    assert!(!base.join("r1").exists());
    assert!(!base.join("r2").exists());
}
