use dirs::config_dir;
use std::path::{Path, PathBuf};

/// Returns the lgpm home directory, or None if it cannot be resolved.
///
/// `LGPM_HOME` wins; otherwise `<config_dir>/lgpm`.
pub fn try_lgpm_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("LGPM_HOME") {
        return Some(PathBuf::from(val));
    }
    config_dir().map(|d| d.join("lgpm"))
}

/// Optional configuration file: `<lgpm home>/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    try_lgpm_home().map(|h| h.join("config.toml"))
}

/// Directory holding the running executable, falling back to the working directory.
pub fn host_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default core modules directory: `<host dir>/bin/modules`
pub fn default_modules_dir() -> PathBuf {
    host_dir().join("bin").join("modules")
}

/// UI plugins directory derived from a core modules directory: its sibling `plugins`.
pub fn derived_ui_plugins_dir(modules_dir: &Path) -> PathBuf {
    modules_dir
        .parent()
        .map_or_else(|| PathBuf::from("plugins"), |p| p.join("plugins"))
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}
