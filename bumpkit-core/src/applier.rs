//! End-to-end release application.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::adapter::{AdapterGetter, ManifestAdapter};
use crate::changelog::ChangelogWriter;
use crate::changeset::{ChangeRecord, ChangeRecordStore};
use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::manifest::ManifestMutator;
use crate::package::{ManifestKind, PackageInfo};
use crate::release::{ReleasePlan, ReleasePlanner};
use crate::release_reporter::ReleaseReporter;
use crate::vcs::VersionControl;

/// The ordered steps of a release run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseStep {
    LoadRecords,
    Plan,
    MutateManifests,
    UpdateChangelogs,
    ClearRecords,
    Commit,
}

impl ReleaseStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStep::LoadRecords => "load-records",
            ReleaseStep::Plan => "plan",
            ReleaseStep::MutateManifests => "mutate-manifests",
            ReleaseStep::UpdateChangelogs => "update-changelogs",
            ReleaseStep::ClearRecords => "clear-records",
            ReleaseStep::Commit => "commit",
        }
    }

    /// Whether a failure in this step can leave the working tree modified.
    pub fn mutates(&self) -> bool {
        !matches!(self, ReleaseStep::LoadRecords | ReleaseStep::Plan)
    }
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finished release run did.
#[derive(Debug, Clone)]
pub struct ReleaseSummary {
    pub plan: ReleasePlan,
    /// Every file or directory changed, in the order it was changed.
    pub applied: Vec<PathBuf>,
    pub commit_message: String,
    pub committed: bool,
}

/// Terminal state of a successful run. Failures surface as [`Error::Aborted`].
#[derive(Debug, Clone)]
pub enum ReleaseOutcome {
    /// There were no pending change records; nothing was touched.
    NoOp,
    Completed(ReleaseSummary),
}

#[derive(Debug, Default)]
struct RunState {
    applied: Vec<PathBuf>,
}

impl RunState {
    fn record(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            if !self.applied.contains(&path) {
                self.applied.push(path);
            }
        }
    }
}

/// Drives a release: load records, plan, bump manifests, write changelogs,
/// clear records and commit.
///
/// Each step runs only after the previous one succeeded. A failure aborts the
/// rest of the run without undoing earlier writes; the returned
/// [`Error::Aborted`] lists everything already changed so it can be
/// inspected and repaired by hand.
pub struct ReleaseApplier {
    config: ReleaseConfig,
    store: ChangeRecordStore,
    vcs: Box<dyn VersionControl>,
    changelog: Box<dyn ChangelogWriter>,
    adapter_getter: Box<AdapterGetter>,
    reporter: Box<dyn ReleaseReporter>,
}

impl ReleaseApplier {
    /// Creates an applier reading change records from `<cwd>/.changeset`.
    pub fn new<V, C, F, R>(
        config: ReleaseConfig,
        vcs: V,
        changelog: C,
        adapter_getter: F,
        reporter: R,
    ) -> Self
    where
        V: VersionControl + 'static,
        C: ChangelogWriter + 'static,
        F: Fn(ManifestKind) -> Box<dyn ManifestAdapter> + Send + Sync + 'static,
        R: ReleaseReporter + 'static,
    {
        let store = ChangeRecordStore::for_workspace(&config.cwd);
        Self {
            config,
            store,
            vcs: Box::new(vcs),
            changelog: Box::new(changelog),
            adapter_getter: Box::new(adapter_getter),
            reporter: Box::new(reporter),
        }
    }

    /// Loads records and computes the plan without touching anything.
    pub fn preview(&self, packages: &[PackageInfo]) -> Result<(Vec<ChangeRecord>, ReleasePlan)> {
        let records = self.store.load_pending(self.vcs.as_ref())?;
        let plan = ReleasePlanner::plan(&records, packages)?;
        Ok((records, plan))
    }

    /// Runs the full release against `packages`.
    ///
    /// # Errors
    ///
    /// Every failure is returned as [`Error::Aborted`] naming the failing
    /// step and the paths already changed. Failures in the load and plan
    /// steps always have an empty change list.
    pub fn run(&self, packages: &[PackageInfo]) -> Result<ReleaseOutcome> {
        let mut state = RunState::default();

        let records = self.step(&mut state, ReleaseStep::LoadRecords, |_| {
            self.store.load_pending(self.vcs.as_ref())
        })?;
        if records.is_empty() {
            info!("no unreleased change records found");
            return Ok(ReleaseOutcome::NoOp);
        }

        let plan = self.step(&mut state, ReleaseStep::Plan, |_| {
            ReleasePlanner::plan(&records, packages)
        })?;
        let commit_message = release_commit_message(&plan, self.config.skip_ci);
        info!(packages = plan.len(), records = records.len(), "computed release plan");

        self.step(&mut state, ReleaseStep::MutateManifests, |state| {
            let mutator = ManifestMutator::new(self.adapter_getter.as_ref(), &self.config.cwd);
            let written = mutator.apply(&plan, packages, &mut |path| self.stage(path))?;
            state.record(written);
            for release in plan.releases.values() {
                self.reporter.report_bump(release);
            }
            Ok(())
        })?;

        if self.config.no_changelog {
            info!("changelog generation disabled");
        } else {
            self.step(&mut state, ReleaseStep::UpdateChangelogs, |state| {
                let written =
                    self.changelog
                        .update(&plan, &records, packages, &mut |path| self.stage(path))?;
                state.record(written);
                Ok(())
            })?;
        }

        self.step(&mut state, ReleaseStep::ClearRecords, |state| {
            self.store.clear()?;
            state.record([self.store.base_dir().to_path_buf()]);
            self.stage(self.store.base_dir())
        })?;

        let committed = if self.config.commit {
            self.step(&mut state, ReleaseStep::Commit, |_| self.vcs.commit(&commit_message))?;
            true
        } else {
            false
        };

        Ok(ReleaseOutcome::Completed(ReleaseSummary {
            plan,
            applied: state.applied,
            commit_message,
            committed,
        }))
    }

    fn stage(&self, path: &Path) -> Result<()> {
        if self.config.commit {
            self.vcs.stage(path)?;
        }
        Ok(())
    }

    fn step<T>(
        &self,
        state: &mut RunState,
        step: ReleaseStep,
        f: impl FnOnce(&mut RunState) -> Result<T>,
    ) -> Result<T> {
        self.reporter.report_step(step);
        info!(%step, "starting release step");

        f(state).map_err(|err| {
            let source = match err {
                Error::PartialApply { written, source } => {
                    state.record(written);
                    *source
                }
                other => other,
            };
            let source = match source {
                Error::VersionControl { message, touched } if touched.is_empty() => {
                    Error::VersionControl {
                        message,
                        touched: state.applied.clone(),
                    }
                }
                other => other,
            };

            if step.mutates() {
                warn!(%step, files = state.applied.len(), "release aborted; changes already applied are left in place");
            }
            Error::Aborted {
                step,
                applied: state.applied.clone(),
                source: Box::new(source),
            }
        })
    }
}

/// Builds the release commit message.
pub fn release_commit_message(plan: &ReleasePlan, skip_ci: bool) -> String {
    let mut message = format!("RELEASING: Releasing {} package(s)\n\nReleases:\n", plan.len());
    for release in plan.direct() {
        message.push_str(&format!("  {}@{}\n", release.name, release.new_version));
    }

    let dependents: Vec<String> = plan
        .cascaded()
        .map(|release| format!("  {}@{}\n", release.name, release.new_version))
        .collect();
    if !dependents.is_empty() {
        message.push_str("\nDependents:\n");
        message.push_str(&dependents.concat());
    }

    if skip_ci {
        message.push_str("\n[skip ci]\n");
    }
    message
}
