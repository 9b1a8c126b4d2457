//! Install command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use lgpm_core::{InstallOptions, Installer, Orchestrator};
use lgpm_schema::PackageName;

use super::{Settings, print_json};
use crate::ui::{self, ConsoleReporter, table};

/// Install packages from the catalog, dependencies first.
pub(crate) async fn install(settings: &Settings, packages: &[String], only_newer: bool) -> Result<()> {
    let reporter = Arc::new(ConsoleReporter::new(settings.json));
    let ctx = settings.context(reporter)?;
    tracing::debug!(
        "Installing into {} (ui: {})",
        ctx.dirs.core.display(),
        ctx.dirs.ui.display()
    );

    let orchestrator = Orchestrator::spawn(ctx);
    let names: Vec<PackageName> = packages.iter().map(PackageName::from).collect();
    let options = InstallOptions {
        skip_if_not_newer: only_newer,
    };

    let summary = orchestrator.install(names, options).await?;
    orchestrator.shutdown().await.ok();

    if settings.json {
        print_json(&summary)?;
    } else {
        println!("{}", table::summary(&summary));
    }

    if !summary.is_success() {
        bail!("{} of {} package(s) failed", summary.failed(), summary.packages.len());
    }
    if !settings.json {
        ui::success(&format!(
            "{} installed, {} skipped",
            summary.installed(),
            summary.skipped()
        ));
    }
    Ok(())
}

/// Install a local container file. The module type comes from its manifest.
pub(crate) async fn install_file(settings: &Settings, path: &Path, only_newer: bool) -> Result<()> {
    if !path.is_file() {
        bail!("No such file: {}", path.display());
    }

    let reporter = Arc::new(ConsoleReporter::new(settings.json));
    let installer = Installer::new(settings.context(reporter)?);
    let options = InstallOptions {
        skip_if_not_newer: only_newer,
    };

    let path_buf = path.to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || installer.install_file(&path_buf, options))
        .await?
        .with_context(|| format!("Failed to install {}", path.display()))?;

    if settings.json {
        return print_json(&outcome);
    }

    if outcome.is_skipped() {
        ui::info(&format!(
            "{} {} is already installed (same or newer)",
            outcome.name(),
            outcome.version()
        ));
    } else {
        ui::success(&format!("Installed {} {}", outcome.name(), outcome.version()));
    }
    Ok(())
}
