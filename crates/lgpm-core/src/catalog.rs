//! Remote package catalog.
//!
//! The catalog is a JSON array of [`PackageRecord`]s published next to the
//! containers of a release. It is fetched fresh for every operation; the
//! `installed` flag of each record is derived locally from the manifests
//! found in the module directories.

use std::collections::BTreeSet;
use std::path::Path;

use lgpm_schema::{ModuleManifest, PackageRecord};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, HttpConfig};
use crate::io::download::{self, DownloadError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to fetch catalog: {0}")]
    Fetch(#[from] DownloadError),

    #[error("Catalog is not a JSON array of packages: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A parsed catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    packages: Vec<PackageRecord>,
}

impl Catalog {
    pub fn new(packages: Vec<PackageRecord>) -> Self {
        Self { packages }
    }

    /// Parse a catalog document.
    ///
    /// The document itself must be a JSON array. Elements that do not look
    /// like a package record are skipped with a warning rather than failing
    /// the whole catalog.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let values: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
        let mut packages = Vec::with_capacity(values.len());

        for (i, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<PackageRecord>(value) {
                Ok(record) => packages.push(record),
                Err(e) => tracing::warn!("Skipping catalog entry #{i}: {e}"),
            }
        }

        Ok(Self { packages })
    }

    pub fn packages(&self) -> &[PackageRecord] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// First record whose name matches exactly (case-sensitive).
    pub fn find(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Sorted, unique, non-empty categories.
    pub fn categories(&self) -> Vec<String> {
        self.packages
            .iter()
            .map(|p| p.category.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Records whose name or description contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&PackageRecord> {
        let needle = query.to_lowercase();
        self.packages
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Records in `category`, ignoring case.
    pub fn in_category(&self, category: &str) -> Vec<&PackageRecord> {
        self.packages
            .iter()
            .filter(|p| p.category.eq_ignore_ascii_case(category.trim()))
            .collect()
    }

    /// Records that can be listed and installed, optionally narrowed to one
    /// category. Records without a container file are skipped.
    pub fn list_packages(&self, category: Option<&str>) -> Vec<&PackageRecord> {
        self.packages
            .iter()
            .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c.trim())))
            .filter(|p| {
                if p.container_file.is_empty() {
                    tracing::warn!("Package {} has no container file, skipping", p.name);
                    return false;
                }
                true
            })
            .collect()
    }

    /// Set each record's `installed` flag from a set of installed module names.
    pub fn mark_installed(&mut self, installed: &BTreeSet<String>) {
        for record in &mut self.packages {
            record.installed = installed.contains(&record.module_name);
        }
    }
}

/// Fetches the catalog of one release.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    http: HttpConfig,
    url: String,
}

impl CatalogClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            http: config.http.clone(),
            url: config.catalog_url(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let bytes = download::fetch_bytes(&self.client, &self.http, &self.url).await?;
        let catalog = Catalog::parse(&bytes)?;
        tracing::debug!("Fetched {} packages from {}", catalog.len(), self.url);
        Ok(catalog)
    }

    /// Like [`fetch`](Self::fetch), but degrade to an empty catalog.
    pub async fn fetch_or_empty(&self) -> (Catalog, Option<CatalogError>) {
        match self.fetch().await {
            Ok(catalog) => (catalog, None),
            Err(e) => {
                tracing::warn!("{e}");
                (Catalog::default(), Some(e))
            }
        }
    }
}

/// Names declared by the manifests of every module installed under `base_dirs`.
///
/// Only immediate subdirectories with a readable manifest count; stray files
/// and hidden directories (install staging leftovers) never mark a package as
/// installed.
pub fn list_installed<P: AsRef<Path>>(base_dirs: &[P]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for base in base_dirs {
        let Ok(entries) = std::fs::read_dir(base.as_ref()) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            match ModuleManifest::load_from_dir(&path) {
                Ok(manifest) if !manifest.name.is_empty() => {
                    names.insert(manifest.name);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Ignoring {}: {e}", path.display()),
            }
        }
    }

    names
}

/// Version recorded in `<base>/<name>/manifest.json`, first base dir wins.
pub fn installed_version<P: AsRef<Path>>(base_dirs: &[P], name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    base_dirs.iter().find_map(|base| {
        ModuleManifest::load_from_dir(&base.as_ref().join(name))
            .ok()
            .map(|m| m.version)
            .filter(|v| !v.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgpm_schema::ModuleType;
    use mockito::Server;

    const CATALOG: &str = r#"[
        {"name": "waku_module", "description": "Waku messaging", "category": "Network",
         "type": "core", "moduleName": "waku_module", "author": "Logos",
         "dependencies": [], "package": "waku_module.lgx"},
        {"name": "chat", "description": "Chat over Waku", "category": "network",
         "type": "core", "moduleName": "chat", "dependencies": ["waku_module"],
         "package": "chat.lgx"},
        {"name": "chat_ui", "description": "Chat window", "category": "UI",
         "type": "ui", "moduleName": "chat_ui", "dependencies": ["chat"],
         "package": "chat_ui.lgx"},
        {"name": "draft", "description": "Not published yet", "category": "UI"},
        {"description": "no name"}
    ]"#;

    fn write_manifest(dir: &Path, name: &str, version: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("manifest.json"),
            format!(r#"{{"name": "{name}", "version": "{version}"}}"#),
        )
        .unwrap();
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let catalog = Catalog::parse(CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 4);

        let chat_ui = catalog.find("chat_ui").unwrap();
        assert_eq!(chat_ui.module_type, ModuleType::Ui);
        assert_eq!(chat_ui.dependencies, vec!["chat"]);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(Catalog::parse(br#"{"name": "waku_module"}"#).is_err());
        assert!(Catalog::parse(b"<html>").is_err());
    }

    #[test]
    fn test_find_is_exact() {
        let catalog = Catalog::parse(CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.find("chat").unwrap().name, "chat");
        assert!(catalog.find("Chat").is_none());
        assert!(catalog.find("cha").is_none());
    }

    #[test]
    fn test_categories_search_and_listing() {
        let catalog = Catalog::parse(CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.categories(), vec!["Network", "UI", "network"]);
        assert_eq!(catalog.in_category("NETWORK").len(), 2);

        let hits: Vec<_> = catalog.search("WAKU").iter().map(|p| p.name.as_str()).collect();
        assert_eq!(hits, vec!["waku_module", "chat"]);

        let ui: Vec<_> = catalog
            .list_packages(Some("ui"))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(ui, vec!["chat_ui"]);
        assert_eq!(catalog.list_packages(None).len(), 3);
    }

    #[test]
    fn test_installed_detection_uses_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let modules = dir.path().join("modules");
        let plugins = dir.path().join("plugins");
        write_manifest(&modules.join("waku_module"), "waku_module", "0.4.0");
        write_manifest(&plugins.join("chat_ui"), "chat_ui", "1.0");
        // A directory without a manifest and a stray file are ignored.
        std::fs::create_dir_all(modules.join("chat")).unwrap();
        std::fs::write(modules.join("chat.so"), b"stale").unwrap();

        let installed = list_installed(&[&modules, &plugins]);
        assert_eq!(
            installed.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["chat_ui", "waku_module"]
        );

        let mut catalog = Catalog::parse(CATALOG.as_bytes()).unwrap();
        catalog.mark_installed(&installed);
        assert!(catalog.find("waku_module").unwrap().installed);
        assert!(!catalog.find("chat").unwrap().installed);

        assert_eq!(
            installed_version(&[&modules, &plugins], "chat_ui").as_deref(),
            Some("1.0")
        );
        assert_eq!(installed_version(&[&modules], "chat"), None);
    }

    #[test]
    fn test_staging_leftovers_are_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let modules = dir.path().join("modules");
        write_manifest(&modules.join(".lgpm-staging-abc123"), "chat", "1.0");
        write_manifest(&modules.join(".lgpm-previous-def456"), "waku_module", "0.3.0");

        assert!(list_installed(&[&modules]).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_from_release() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/download/v1.0.0/list.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CATALOG)
            .create_async()
            .await;

        let config = Config {
            releases_url: server.url(),
            release: "v1.0.0".into(),
            ..Config::default()
        };
        let client = download::build_client(&config.http).unwrap();
        let catalog = CatalogClient::new(client, &config).fetch().await.unwrap();
        assert_eq!(catalog.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_or_empty_on_bad_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/latest/download/list.json")
            .with_status(200)
            .with_body("{\"oops\": true}")
            .create_async()
            .await;

        let config = Config {
            releases_url: server.url(),
            ..Config::default()
        };
        let client = download::build_client(&config.http).unwrap();
        let (catalog, err) = CatalogClient::new(client, &config).fetch_or_empty().await;
        assert!(catalog.is_empty());
        assert!(matches!(err, Some(CatalogError::Parse(_))));
    }
}
