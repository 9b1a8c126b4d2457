//! Shared installation context.
//!
//! Groups the state every install step needs (resolved directories, HTTP
//! client, reporter, platform and codec) so the orchestrator can hand a
//! cheap clone to each batch.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use lgpm_schema::Platform;

use crate::Reporter;
use crate::catalog::CatalogClient;
use crate::config::{Config, ModuleDirs};
use crate::io::container::{ContainerCodec, LgxCodec};
use crate::io::download;

#[derive(Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub dirs: ModuleDirs,
    pub client: reqwest::Client,
    pub reporter: Arc<dyn Reporter>,
    pub platform: Platform,
    pub codec: Arc<dyn ContainerCodec>,
    /// Where downloads and extraction scratch directories are created.
    pub scratch_root: PathBuf,
}

impl Context {
    pub fn new(config: Config, reporter: Arc<dyn Reporter>) -> reqwest::Result<Self> {
        let client = download::build_client(&config.http)?;
        let dirs = ModuleDirs::resolve(&config);
        Ok(Self {
            config: Arc::new(config),
            dirs,
            client,
            reporter,
            platform: Platform::current(),
            codec: Arc::new(LgxCodec),
            scratch_root: std::env::temp_dir(),
        })
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    pub fn catalog_client(&self) -> CatalogClient {
        CatalogClient::new(self.client.clone(), &self.config)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("dirs", &self.dirs)
            .field("platform", &self.platform)
            .field("codec", &self.codec)
            .field("scratch_root", &self.scratch_root)
            .finish_non_exhaustive()
    }
}
