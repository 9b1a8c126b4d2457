//! List command

use anyhow::Result;

use super::{Settings, print_json};
use crate::ui::{self, table};

/// List available packages, optionally narrowed to a category or to
/// installed ones.
pub(crate) async fn list(settings: &Settings, category: Option<&str>, installed: bool) -> Result<()> {
    let catalog = settings.catalog().await?;
    let packages: Vec<_> = catalog
        .list_packages(category)
        .into_iter()
        .filter(|p| !installed || p.installed)
        .collect();

    if settings.json {
        return print_json(&packages);
    }

    if packages.is_empty() {
        ui::info("No packages found");
        return Ok(());
    }

    println!("{}", table::packages(&packages));
    ui::info(&format!(
        "{} package(s), {} installed",
        packages.len(),
        packages.iter().filter(|p| p.installed).count()
    ));
    Ok(())
}
