//! Search command

use anyhow::Result;

use super::{Settings, print_json};
use crate::ui::{self, table};

/// Search the catalog by name or description
pub(crate) async fn search(settings: &Settings, query: &str) -> Result<()> {
    let catalog = settings.catalog().await?;
    let results = catalog.search(query);

    if settings.json {
        return print_json(&results);
    }

    if results.is_empty() {
        ui::info(&format!("No packages found matching '{query}'"));
        return Ok(());
    }

    ui::section(&format!("Packages matching '{query}'"));
    println!("{}", table::packages(&results));
    Ok(())
}
