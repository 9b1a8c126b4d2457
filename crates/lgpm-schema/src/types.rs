use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// One entry of the remote package catalog (`list.json`).
///
/// Records are immutable snapshots: the catalog is fetched fresh for every
/// operation, and `installed` is derived locally after the fetch rather than
/// read from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Unique catalog key (e.g. `waku_module`).
    pub name: PackageName,

    /// One-line human description.
    #[serde(default)]
    pub description: String,

    /// Free-form grouping used by `lgpm categories` and `list --category`.
    #[serde(default)]
    pub category: String,

    /// Whether the module is a core library or a UI plugin.
    #[serde(rename = "type", default)]
    pub module_type: ModuleType,

    /// On-disk directory name of the installed module.
    #[serde(rename = "moduleName", default)]
    pub module_name: String,

    /// Package author or maintaining organization.
    #[serde(default)]
    pub author: String,

    /// Names of packages that must be installed first, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<PackageName>,

    /// Remote file name of the binary container.
    #[serde(rename = "package", default)]
    pub container_file: String,

    /// Optional SHA-256 of the container; verified after download when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Derived locally from the module directories; never trusted from the wire.
    #[serde(default, skip_deserializing)]
    pub installed: bool,
}

impl PackageRecord {
    /// Create a record with only the identifying fields set.
    pub fn new(name: impl Into<PackageName>, module_type: ModuleType) -> Self {
        let name = name.into();
        Self {
            module_name: name.to_string(),
            name,
            description: String::new(),
            category: String::new(),
            module_type,
            author: String::new(),
            dependencies: Vec::new(),
            container_file: String::new(),
            sha256: None,
            installed: false,
        }
    }
}

/// Classification of an installable module.
///
/// The catalog's `type` field is free-form; only the literal `ui` selects the
/// UI plugin directory, every other value installs as a core module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum ModuleType {
    /// A core library loaded by the host's module manager.
    #[default]
    Core,
    /// A UI plugin loaded by the host's shell.
    Ui,
}

impl ModuleType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Ui => "ui",
        }
    }
}

impl From<String> for ModuleType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&str> for ModuleType {
    fn from(s: &str) -> Self {
        if s == "ui" {
            Self::Ui
        } else {
            Self::Core
        }
    }
}

impl From<ModuleType> for &'static str {
    fn from(t: ModuleType) -> Self {
        t.as_str()
    }
}

impl std::fmt::Display for ModuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog package name.
///
/// Lookups are exact and case-sensitive, so unlike most user input the name
/// is stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Create a package name from the given string (stored as-is).
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for PackageName {
    fn eq(&self, other: &String) -> bool {
        self.0 == *other
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for PackageName {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}
