//! Release reporter implementation for CLI.

use bumpkit_core::applier::ReleaseStep;
use bumpkit_core::release::PlannedRelease;
use bumpkit_core::release_reporter::ReleaseReporter;

use crate::formatting::{print_info, print_success};

/// CLI implementation of ReleaseReporter.
pub struct CliReleaseReporter;

impl ReleaseReporter for CliReleaseReporter {
    fn report_step(&self, step: ReleaseStep) {
        let message = match step {
            ReleaseStep::LoadRecords => return,
            ReleaseStep::Plan => "Planning release...",
            ReleaseStep::MutateManifests => "Updating package manifests...",
            ReleaseStep::UpdateChangelogs => "Updating changelogs...",
            ReleaseStep::ClearRecords => "Removing changesets...",
            ReleaseStep::Commit => "Committing changes...",
        };
        print_info(message);
    }

    fn report_bump(&self, release: &PlannedRelease) {
        print_success(&format!(
            "Bumped {} from {} to {}",
            release.name, release.old_version, release.new_version
        ));
    }
}
