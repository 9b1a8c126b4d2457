//! Module manifest parsing.
//!
//! Every container carries a `manifest.json` at its root, and the installer
//! writes the same document into `<modulesDir>/<moduleName>/manifest.json`.
//! It is the only authoritative source of a module's version; the catalog
//! does not carry one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the manifest inside a container root and an installed module.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors raised while reading a manifest from disk.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The manifest file is not valid JSON of the expected shape.
    #[error("Invalid manifest {path}: {source}")]
    Parse {
        /// Path that was being parsed.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Descriptor written alongside an installed module.
///
/// Unknown keys are preserved in `extra` so that rewriting a manifest never
/// drops metadata added by newer packaging tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Module name; doubles as the install directory name.
    #[serde(default)]
    pub name: String,

    /// Dot-separated numeric version (e.g. `1.4.0`).
    #[serde(default)]
    pub version: String,

    /// Human description.
    #[serde(default)]
    pub description: String,

    /// Free-form module kind (`core`, `ui`, ...).
    #[serde(rename = "type", default)]
    pub type_: String,

    /// Entry-point library file name keyed by variant tag.
    #[serde(default)]
    pub main: BTreeMap<String, String>,

    /// Any additional fields, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ModuleManifest {
    /// Parse a manifest from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Load `<dir>/manifest.json`.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(MANIFEST_FILE);
        let bytes = std::fs::read(&path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_slice(&bytes).map_err(|source| ManifestError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Entry point declared for the first of `variants` that has one.
    pub fn entry_point<'a, I>(&self, variants: I) -> Option<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        variants.into_iter().find_map(|v| {
            self.main
                .get(v)
                .filter(|f| !f.is_empty())
                .map(String::as_str)
        })
    }
}
