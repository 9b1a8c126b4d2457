//! Network and archive I/O.

pub mod container;
pub mod download;

pub use container::{
    Container, ContainerBuilder, ContainerCodec, ContainerError, ContainerMetadata, LgxCodec,
};
pub use download::{DownloadError, DownloadRequest, DownloadedFile, build_client, fetch_bytes};
