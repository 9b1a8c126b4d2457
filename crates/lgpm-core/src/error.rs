//! Domain-specific errors for package operations

use std::path::PathBuf;

use lgpm_schema::PackageName;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::io::container::ContainerError;
use crate::io::download::DownloadError;

/// Everything that can stop a single package from installing.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Failed to fetch catalog: {0}")]
    CatalogFetch(#[source] DownloadError),

    #[error("Failed to parse catalog: {0}")]
    CatalogParse(#[source] serde_json::Error),

    #[error("No variant for platform {platform} (container provides: {available})")]
    UnsupportedPlatform { platform: String, available: String },

    #[error("Download of {name} failed: {source}")]
    Download {
        name: PackageName,
        #[source]
        source: DownloadError,
    },

    #[error("Failed to extract container: {0}")]
    Extract(#[from] ContainerError),

    #[error("Failed to copy {}: {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Package not found: {0}")]
    NotFound(PackageName),

    #[error("Package {0} has no container file in the catalog")]
    MissingContainer(PackageName),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Install engine has shut down")]
    Shutdown,
}

impl From<CatalogError> for PackageError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Fetch(source) => Self::CatalogFetch(source),
            CatalogError::Parse(source) => Self::CatalogParse(source),
        }
    }
}
