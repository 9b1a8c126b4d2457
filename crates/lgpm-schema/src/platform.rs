//! Platform variant tags.
//!
//! A container embeds one subtree per platform, keyed by a tag such as
//! `linux-x86_64`. Publishers are not consistent about architecture names,
//! so the installer also accepts the common aliases (`amd64`, `aarch64`)
//! under the same OS prefix.
//!
//! # Example
//!
//! ```
//! use lgpm_schema::Platform;
//!
//! let current = Platform::current();
//! println!("Running on: {}", current);
//! ```

use std::path::Path;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Linux.
    Linux,
    /// macOS.
    Darwin,
    /// Windows.
    Windows,
    /// Anything else; no container will match.
    Unknown,
}

impl OsFamily {
    /// Get the current OS family
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    /// Tag prefix used in variant names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuArch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Arm64,
    /// 32-bit x86 and anything unrecognised.
    X86,
}

impl CpuArch {
    /// Get the current architecture
    pub fn current() -> Self {
        if cfg!(target_arch = "x86_64") {
            Self::X86_64
        } else if cfg!(target_arch = "aarch64") {
            Self::Arm64
        } else {
            Self::X86
        }
    }

    /// Canonical tag component.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
        }
    }

    /// Alternative spelling seen in published containers, if any.
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Self::X86_64 => Some("amd64"),
            Self::Arm64 => Some("aarch64"),
            Self::X86 => None,
        }
    }
}

impl std::str::FromStr for CpuArch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "x86" | "i686" | "i386" => Ok(Self::X86),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

/// The running platform, as far as variant selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system family.
    pub os: OsFamily,
    /// CPU architecture.
    pub arch: CpuArch,
}

impl Platform {
    /// Build a platform from explicit parts.
    pub fn new(os: OsFamily, arch: CpuArch) -> Self {
        Self { os, arch }
    }

    /// Get the platform this binary was compiled for.
    pub fn current() -> Self {
        Self::new(OsFamily::current(), CpuArch::current())
    }

    /// Primary variant tag, or `unknown` on unsupported systems.
    pub fn variant(&self) -> String {
        match self.os {
            OsFamily::Unknown => "unknown".to_string(),
            // No 32-bit ARM or other builds are published for macOS.
            OsFamily::Darwin if self.arch == CpuArch::X86 => "unknown".to_string(),
            os => format!("{}-{}", os.as_str(), self.arch.as_str()),
        }
    }

    /// Tags accepted for this platform, primary tag first.
    pub fn variants_to_try(&self) -> Vec<String> {
        let primary = self.variant();
        if primary == "unknown" {
            return vec![primary];
        }

        let mut tags = vec![primary];
        if let Some(alias) = self.arch.alias() {
            tags.push(format!("{}-{alias}", self.os.as_str()));
        }
        tags
    }

    /// File suffix of dynamic libraries (`.so`, `.dylib`, `.dll`).
    pub fn library_suffix(&self) -> &'static str {
        match self.os {
            OsFamily::Darwin => ".dylib",
            OsFamily::Windows => ".dll",
            OsFamily::Linux | OsFamily::Unknown => ".so",
        }
    }

    /// Returns `true` if `path` looks like a loadable library on this platform.
    pub fn is_library_file(&self, path: &Path) -> bool {
        let suffix = self.library_suffix();
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.len() > suffix.len() && n.ends_with(suffix))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.variant())
    }
}
