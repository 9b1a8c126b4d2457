//! Categories command

use anyhow::Result;

use super::{Settings, print_json};
use crate::ui;

pub(crate) async fn categories(settings: &Settings) -> Result<()> {
    let catalog = settings.catalog().await?;
    let categories = catalog.categories();

    if settings.json {
        return print_json(&categories);
    }

    if categories.is_empty() {
        ui::info("No categories found");
        return Ok(());
    }
    for category in &categories {
        let count = catalog.in_category(category).len();
        println!("  {category} ({count})");
    }
    Ok(())
}
