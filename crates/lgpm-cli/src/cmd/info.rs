//! Info command

use anyhow::{Result, bail};
use lgpm_core::{installed_version, resolve};
use lgpm_schema::{PackageName, PackageRecord};
use serde::Serialize;

use super::{Settings, print_json};
use crate::ui::table;

#[derive(Serialize)]
struct PackageInfo<'a> {
    #[serde(flatten)]
    record: &'a PackageRecord,
    installed_version: Option<String>,
    install_order: Vec<PackageName>,
}

/// Show details for a single package
pub(crate) async fn info(settings: &Settings, name: &str) -> Result<()> {
    let catalog = settings.catalog().await?;
    let Some(record) = catalog.find(name) else {
        bail!("Package '{name}' not found");
    };

    let dirs = settings.dirs();
    let info = PackageInfo {
        record,
        installed_version: installed_version(&dirs.all(), &record.module_name),
        install_order: resolve(&[record.name.clone()], &catalog).order,
    };

    if settings.json {
        return print_json(&info);
    }

    println!(
        "{}",
        table::details(
            record,
            info.installed_version.as_deref(),
            &info.install_order,
            dirs.for_type(record.module_type),
        )
    );
    Ok(())
}
