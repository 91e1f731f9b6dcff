//! `bumpkit version`: apply pending changesets.

use std::path::PathBuf;

use anyhow::Result;
use bumpkit_adapters::get_adapter;
use bumpkit_core::{
    GitCli, MarkdownChangelog, ReleaseApplier, ReleaseConfig, ReleaseOutcome, VersionOptions,
};

use crate::formatting::{
    print_block, print_key_value, print_path_list, print_release_table,
    print_section_header, print_success, print_warning, SectionStyle,
};

use super::release_reporter::CliReleaseReporter;
use super::{ordered_releases, scan_workspace};

pub fn cmd_version(cwd: PathBuf, options: VersionOptions) -> Result<()> {
    let config = ReleaseConfig::resolve(&cwd, options)?;
    let packages = scan_workspace(&config.cwd)?;

    let applier = ReleaseApplier::new(
        config.clone(),
        GitCli::new(&config.cwd),
        MarkdownChangelog,
        get_adapter,
        CliReleaseReporter,
    );

    let summary = match applier.run(&packages) {
        Ok(ReleaseOutcome::NoOp) => {
            print_warning("No unreleased changesets found, exiting.");
            return Ok(());
        }
        Ok(ReleaseOutcome::Completed(summary)) => summary,
        Err(err) => {
            if !err.applied_paths().is_empty() {
                print_section_header(
                    "Changes already applied (not rolled back)",
                    SectionStyle::Warning,
                );
                print_path_list(err.applied_paths(), &config.cwd);
            }
            return Err(err.into());
        }
    };

    println!();
    print_section_header("Release", SectionStyle::Primary);
    print_key_value("Packages released", &summary.plan.len().to_string());
    println!();
    print_release_table(&ordered_releases(&summary.plan, &packages));
    println!();

    if summary.committed {
        print_success("Release commit created");
        print_block(&summary.commit_message);
    } else {
        print_success("All files have been updated. Review them and commit at your leisure");
        print_warning(
            "If you alter versions in the manifests, keep dependent constraints in sync before publishing",
        );
    }
    println!();

    Ok(())
}
