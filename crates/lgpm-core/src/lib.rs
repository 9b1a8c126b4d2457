//! Engine for installing host modules: catalog client, dependency resolver,
//! container codec, install engine and the serializing install orchestrator.

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod install;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod reporter;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, CatalogClient, CatalogError, installed_version, list_installed};
pub use config::{Config, ConfigError, HttpConfig, ModuleDirs};
pub use context::Context;
pub use error::PackageError;
pub use install::{InstallOptions, InstallOutcome, InstalledModule, Installer};
pub use orchestrator::{BatchSummary, Orchestrator, PackageReport, Phase, RequestId, StatusSnapshot};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{Resolution, resolve};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("lgpm-core/", env!("CARGO_PKG_VERSION"));
