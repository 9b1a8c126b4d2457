//! Shared types for lgpm.
//!
//! Everything in this crate is pure data: the catalog record served by the
//! release host, the manifest written next to every installed module, the
//! platform variant tags embedded in containers and the version ordering
//! used by the skip policy. No network or filesystem access happens here.

pub mod manifest;
pub mod platform;
pub mod types;
pub mod version;

// Re-exports
pub use manifest::{MANIFEST_FILE, ManifestError, ModuleManifest};
pub use platform::{CpuArch, OsFamily, Platform};
pub use types::*;
pub use version::{compare_versions, version_ge};

/// File name of the catalog published alongside the containers.
pub const CATALOG_FILE: &str = "list.json";
