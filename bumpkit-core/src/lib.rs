//! Core library for changeset-driven monorepo releases.

pub mod adapter;
pub mod applier;
pub mod changelog;
pub mod changeset;
pub mod config;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod package;
pub mod release;
pub mod release_reporter;
pub mod scanner;
pub mod vcs;

pub use adapter::{AdapterGetter, ManifestAdapter};
pub use applier::{release_commit_message, ReleaseApplier, ReleaseOutcome, ReleaseStep, ReleaseSummary};
pub use changelog::{ChangelogWriter, MarkdownChangelog};
pub use changeset::{ChangeRecord, ChangeRecordStore, ChangeRelease};
pub use config::{ReleaseConfig, VersionOptions};
pub use error::{Error, Result};
pub use graph::DependencyGraph;
pub use manifest::ManifestMutator;
pub use package::{ManifestKind, PackageInfo};
pub use release::{BumpType, PlannedRelease, ReleasePlan, ReleasePlanner, CASCADE_MARKER};
pub use release_reporter::{ReleaseReporter, SilentReporter};
pub use scanner::Scanner;
pub use vcs::{GitCli, VersionControl};
