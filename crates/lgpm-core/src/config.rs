//! Engine configuration.
//!
//! Configuration is an explicit value handed to the orchestrator when it is
//! spawned. Layers are applied lowest to highest precedence:
//!
//! ```text
//! defaults -> config.toml -> LGPM_* environment -> command-line flags
//! ```
//!
//! The last layer is applied by the caller by mutating the returned struct.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::paths;

/// Default release host for catalogs and containers.
pub const DEFAULT_RELEASES_URL: &str = "https://github.com/logos-co/logos-modules/releases";

/// Release tag that tracks the newest published release.
pub const LATEST_RELEASE: &str = "latest";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration for an lgpm engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Core modules directory. `None` means `<host dir>/bin/modules`.
    pub modules_dir: Option<PathBuf>,
    /// UI plugins directory. `None` means the sibling `plugins` directory
    /// of the core modules directory.
    pub ui_plugins_dir: Option<PathBuf>,
    /// Base URL of the release host.
    pub releases_url: String,
    /// Release tag to install from.
    pub release: String,
    /// Network timeouts and retry policy.
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules_dir: None,
            ui_plugins_dir: None,
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            release: LATEST_RELEASE.to_string(),
            http: HttpConfig::default(),
        }
    }
}

/// Timeouts and retry policy for every network request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds (includes the body transfer).
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Initial backoff; doubled on every retry.
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Backoff before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

impl Config {
    /// Load defaults, then the config file (if any), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match paths::config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay `LGPM_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("LGPM_MODULES_DIR") {
            self.modules_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = non_empty("LGPM_UI_PLUGINS_DIR") {
            self.ui_plugins_dir = Some(PathBuf::from(dir));
        }
        if let Some(release) = non_empty("LGPM_RELEASE") {
            self.release = release;
        }
        if let Some(url) = non_empty("LGPM_RELEASES_URL") {
            self.releases_url = url;
        }
    }

    /// Base URL that catalog and container file names are appended to.
    pub fn download_base(&self) -> String {
        let base = self.releases_url.trim_end_matches('/');
        let release = self.release.trim();
        if release.is_empty() || release == LATEST_RELEASE {
            format!("{base}/{LATEST_RELEASE}/download")
        } else {
            format!("{base}/download/{release}")
        }
    }

    /// URL of the package catalog.
    pub fn catalog_url(&self) -> String {
        format!("{}/{}", self.download_base(), lgpm_schema::CATALOG_FILE)
    }

    /// URL of a container file.
    pub fn container_url(&self, file: &str) -> String {
        format!("{}/{file}", self.download_base())
    }
}

/// Concrete install directories, resolved once per engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDirs {
    /// Core modules directory.
    pub core: PathBuf,
    /// UI plugins directory.
    pub ui: PathBuf,
}

impl ModuleDirs {
    pub fn resolve(config: &Config) -> Self {
        let core = config
            .modules_dir
            .clone()
            .unwrap_or_else(paths::default_modules_dir);
        let ui = config
            .ui_plugins_dir
            .clone()
            .unwrap_or_else(|| paths::derived_ui_plugins_dir(&core));
        Self { core, ui }
    }

    /// Target base directory for a module type.
    pub fn for_type(&self, module_type: lgpm_schema::ModuleType) -> &Path {
        match module_type {
            lgpm_schema::ModuleType::Core => &self.core,
            lgpm_schema::ModuleType::Ui => &self.ui,
        }
    }

    /// Both base directories, core first.
    pub fn all(&self) -> [&Path; 2] {
        [&self.core, &self.ui]
    }
}
