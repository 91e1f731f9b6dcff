//! Trait for reporting release progress.

use crate::applier::ReleaseStep;
use crate::release::PlannedRelease;

/// Receives progress from the release applier.
///
/// This trait allows the core library to report release operations without
/// directly writing to stdout/stderr.
pub trait ReleaseReporter {
    /// Called when a step starts.
    fn report_step(&self, step: ReleaseStep);

    /// Called once per package after its manifest has been bumped.
    fn report_bump(&self, release: &PlannedRelease);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ReleaseReporter for SilentReporter {
    fn report_step(&self, _step: ReleaseStep) {}

    fn report_bump(&self, _release: &PlannedRelease) {}
}
