//! `bumpkit status`: show what the next release would do.

use std::path::PathBuf;

use anyhow::Result;
use bumpkit_adapters::get_adapter;
use bumpkit_core::{
    GitCli, MarkdownChangelog, ReleaseApplier, ReleaseConfig, SilentReporter, VersionOptions,
};

use crate::formatting::{
    print_key_value, print_release_table, print_section_header, print_success, SectionStyle,
};

use super::{ordered_releases, scan_workspace};

pub fn cmd_status(cwd: PathBuf, json: bool) -> Result<()> {
    let config = ReleaseConfig::resolve(&cwd, VersionOptions::default())?;
    let packages = scan_workspace(&config.cwd)?;

    let applier = ReleaseApplier::new(
        config.clone(),
        GitCli::new(&config.cwd),
        MarkdownChangelog,
        get_adapter,
        SilentReporter,
    );
    let (records, plan) = applier.preview(&packages)?;

    if json {
        let output = serde_json::json!({
            "changesets": records,
            "releases": ordered_releases(&plan, &packages),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_section_header("Release Status", SectionStyle::Primary);
    if plan.is_empty() {
        print_success("No unreleased changesets");
        println!();
        return Ok(());
    }

    print_key_value("Changesets", &records.len().to_string());
    print_key_value("Packages to release", &plan.len().to_string());
    println!();
    print_release_table(&ordered_releases(&plan, &packages));
    println!();

    Ok(())
}
