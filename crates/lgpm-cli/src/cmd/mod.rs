//! Command implementations

use std::sync::Arc;

use anyhow::{Context as _, Result};
use lgpm_core::{Catalog, CatalogClient, Config, Context, ModuleDirs, Reporter, list_installed};
use serde::Serialize;

use crate::Cli;

pub(crate) mod categories;
pub(crate) mod completions;
pub(crate) mod info;
pub(crate) mod install;
pub(crate) mod list;
pub(crate) mod search;

/// Effective configuration for one invocation.
pub(crate) struct Settings {
    pub(crate) config: Config,
    pub(crate) json: bool,
}

impl Settings {
    /// Defaults, config file and environment, then command-line flags on top.
    pub(crate) fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Config::load().context("Failed to load configuration")?;
        if let Some(dir) = &cli.modules_dir {
            config.modules_dir = Some(dir.clone());
        }
        if let Some(dir) = &cli.ui_plugins_dir {
            config.ui_plugins_dir = Some(dir.clone());
        }
        if let Some(release) = &cli.release {
            config.release.clone_from(release);
        }
        tracing::debug!("Effective config: {config:?}");

        Ok(Self {
            config,
            json: cli.json,
        })
    }

    pub(crate) fn dirs(&self) -> ModuleDirs {
        ModuleDirs::resolve(&self.config)
    }

    pub(crate) fn context(&self, reporter: Arc<dyn Reporter>) -> Result<Context> {
        Context::new(self.config.clone(), reporter).context("Failed to create HTTP client")
    }

    /// Fetch the catalog and mark what is installed locally.
    pub(crate) async fn catalog(&self) -> Result<Catalog> {
        let ctx = self.context(Arc::new(lgpm_core::NullReporter))?;
        let client = CatalogClient::new(ctx.client.clone(), &self.config);
        let mut catalog = client
            .fetch()
            .await
            .with_context(|| format!("Failed to fetch package list from {}", client.url()))?;

        catalog.mark_installed(&list_installed(&ctx.dirs.all()));
        Ok(catalog)
    }
}

/// Pretty-print `value` as JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
