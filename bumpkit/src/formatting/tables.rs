//! Table formatting utilities using comfy-table.

use bumpkit_core::release::{BumpType, PlannedRelease};
use comfy_table::{Cell, Table};

/// Prints the planned releases, one row per package.
pub fn print_release_table(releases: &[&PlannedRelease]) {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Type").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Package").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Version").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Changesets").add_attribute(comfy_table::Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);

    for release in releases {
        let version_str = format!("{} → {}", release.old_version, release.new_version);
        let (type_label, type_color) = match release.bump {
            BumpType::Major => ("MAJOR", comfy_table::Color::Red),
            BumpType::Minor => ("MINOR", comfy_table::Color::Yellow),
            BumpType::Patch => ("PATCH", comfy_table::Color::Green),
        };
        table.add_row(vec![
            Cell::new(type_label).fg(type_color),
            Cell::new(&release.name).fg(comfy_table::Color::White),
            Cell::new(version_str).fg(comfy_table::Color::Cyan),
            Cell::new(release.contributing_records.join(", ")).fg(comfy_table::Color::DarkGrey),
        ]);
    }

    println!("{}", table);
}
