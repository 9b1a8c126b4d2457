//! Table rendering with comfy-table

use std::path::Path;

use comfy_table::presets::UTF8_HORIZONTAL_ONLY;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use lgpm_core::BatchSummary;
use lgpm_schema::{PackageName, PackageRecord};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| Cell::new(l).add_attribute(Attribute::Bold))
        .collect()
}

fn join(names: &[PackageName]) -> String {
    if names.is_empty() {
        return "-".to_string();
    }
    names.iter().map(PackageName::as_str).collect::<Vec<_>>().join(", ")
}

/// Name | Type | Category | Installed | Description
pub(crate) fn packages(records: &[&PackageRecord]) -> Table {
    let mut table = base_table();
    table.set_header(header(&["Name", "Type", "Category", "Installed", "Description"]));

    for record in records {
        let installed = if record.installed {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&record.name).fg(Color::Cyan),
            Cell::new(record.module_type),
            Cell::new(&record.category),
            installed,
            Cell::new(&record.description),
        ]);
    }
    table
}

/// Two-column key/value view of one package.
pub(crate) fn details(
    record: &PackageRecord,
    installed_version: Option<&str>,
    install_order: &[PackageName],
    target_dir: &Path,
) -> Table {
    let mut table = base_table();
    let installed = installed_version.map_or_else(
        || Cell::new("not installed").fg(Color::DarkGrey),
        |v| Cell::new(v).fg(Color::Green),
    );

    let rows = [
        ("Name", Cell::new(&record.name).fg(Color::Cyan)),
        ("Description", Cell::new(&record.description)),
        ("Category", Cell::new(&record.category)),
        ("Type", Cell::new(record.module_type)),
        ("Module name", Cell::new(&record.module_name)),
        ("Author", Cell::new(&record.author)),
        ("Dependencies", Cell::new(join(&record.dependencies))),
        ("Install order", Cell::new(join(install_order))),
        ("Container", Cell::new(&record.container_file)),
        ("Installed", installed),
        ("Target", Cell::new(target_dir.join(&record.module_name).display())),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), value]);
    }
    table
}

/// Package | Status | Version | Detail
pub(crate) fn summary(summary: &BatchSummary) -> Table {
    let mut table = base_table();
    table.set_header(header(&["Package", "Status", "Version", "Detail"]));

    for report in &summary.packages {
        let (status, detail) = match (&report.error, report.skipped) {
            (Some(error), _) => (Cell::new("failed").fg(Color::Red), error.clone()),
            (None, true) => (
                Cell::new("skipped").fg(Color::Yellow),
                "installed version is the same or newer".to_string(),
            ),
            (None, false) => (
                Cell::new("installed").fg(Color::Green),
                report
                    .installed_dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            ),
        };
        table.add_row(vec![
            Cell::new(&report.name).fg(Color::Cyan),
            status,
            Cell::new(report.version.as_deref().unwrap_or("-")),
            Cell::new(detail),
        ]);
    }
    table
}
