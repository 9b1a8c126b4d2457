//! Module container codec.
//!
//! A container (`.lgx`) is a gzip-compressed tar archive laid out as:
//!
//! ```text
//! manifest.json
//! variants/<tag>/<files...>
//! variants/<other tag>/<files...>
//! ```
//!
//! The installer only talks to the [`ContainerCodec`] and [`Container`]
//! traits, so the on-disk format can change without touching install logic.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use lgpm_schema::{MANIFEST_FILE, ModuleManifest};
use thiserror::Error;

/// Directory inside a container that holds one subtree per platform tag.
pub const VARIANTS_DIR: &str = "variants";

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed container: {0}")]
    Malformed(String),

    #[error("Variant {0} not present in container")]
    MissingVariant(String),

    #[error("Invalid container manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Name, version and description declared by a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Opens containers from disk.
pub trait ContainerCodec: Send + Sync + fmt::Debug {
    fn open(&self, path: &Path) -> Result<Box<dyn Container>, ContainerError>;
}

/// An opened container.
pub trait Container: Send + fmt::Debug {
    /// Platform tags embedded in the container, sorted.
    fn variants(&self) -> Vec<String>;

    fn has_variant(&self, tag: &str) -> bool {
        self.variants().iter().any(|v| v == tag)
    }

    fn metadata(&self) -> ContainerMetadata;

    /// The parsed root manifest.
    fn manifest(&self) -> &ModuleManifest;

    /// The root manifest exactly as stored.
    fn manifest_json(&self) -> &[u8];

    /// Extract one variant subtree into `dest`, returning the written paths.
    fn extract_variant(&self, tag: &str, dest: &Path) -> Result<Vec<PathBuf>, ContainerError>;
}

/// Codec for gzip-compressed tar containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LgxCodec;

impl ContainerCodec for LgxCodec {
    fn open(&self, path: &Path) -> Result<Box<dyn Container>, ContainerError> {
        Ok(Box::new(LgxContainer::open(path)?))
    }
}

#[derive(Debug)]
struct LgxContainer {
    path: PathBuf,
    manifest_raw: Vec<u8>,
    manifest: ModuleManifest,
    variants: BTreeSet<String>,
}

fn archive(path: &Path) -> io::Result<tar::Archive<GzDecoder<BufReader<File>>>> {
    let file = File::open(path)?;
    Ok(tar::Archive::new(GzDecoder::new(BufReader::new(file))))
}

/// Normalize an archive path, rejecting anything that could escape the
/// extraction root.
fn sanitize(path: &Path) -> Result<PathBuf, ContainerError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ContainerError::Malformed(format!(
                    "Invalid path in archive: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(clean)
}

/// `variants/<tag>/...` -> `<tag>`
fn variant_of(path: &Path) -> Option<String> {
    let mut parts = path.components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(root)), Some(Component::Normal(tag))) if *root == *VARIANTS_DIR => {
            Some(tag.to_string_lossy().into_owned())
        }
        _ => None,
    }
}

impl LgxContainer {
    fn open(path: &Path) -> Result<Self, ContainerError> {
        let mut archive = archive(path)?;
        let mut manifest_raw = None;
        let mut variants = BTreeSet::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let rel = sanitize(&entry.path()?)?;

            if rel.as_os_str() == MANIFEST_FILE {
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf)?;
                manifest_raw = Some(buf);
            } else if let Some(tag) = variant_of(&rel) {
                variants.insert(tag);
            }
        }

        let manifest_raw = manifest_raw.ok_or_else(|| {
            ContainerError::Malformed(format!("{MANIFEST_FILE} missing from {}", path.display()))
        })?;
        let manifest = ModuleManifest::from_slice(&manifest_raw)?;

        tracing::debug!(
            "Opened container {} ({} v{}, variants: {:?})",
            path.display(),
            manifest.name,
            manifest.version,
            variants
        );

        Ok(Self {
            path: path.to_path_buf(),
            manifest_raw,
            manifest,
            variants,
        })
    }
}

impl Container for LgxContainer {
    fn variants(&self) -> Vec<String> {
        self.variants.iter().cloned().collect()
    }

    fn has_variant(&self, tag: &str) -> bool {
        self.variants.contains(tag)
    }

    fn metadata(&self) -> ContainerMetadata {
        ContainerMetadata {
            name: self.manifest.name.clone(),
            version: self.manifest.version.clone(),
            description: self.manifest.description.clone(),
        }
    }

    fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    fn manifest_json(&self) -> &[u8] {
        &self.manifest_raw
    }

    fn extract_variant(&self, tag: &str, dest: &Path) -> Result<Vec<PathBuf>, ContainerError> {
        if !self.variants.contains(tag) {
            return Err(ContainerError::MissingVariant(tag.to_string()));
        }

        fs::create_dir_all(dest)?;
        let prefix = Path::new(VARIANTS_DIR).join(tag);
        let mut archive = archive(&self.path)?;
        let mut written = Vec::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let rel = sanitize(&entry.path()?)?;
            let Ok(inner) = rel.strip_prefix(&prefix) else {
                continue;
            };
            if inner.as_os_str().is_empty() {
                continue;
            }

            let target = dest.join(inner);
            let kind = entry.header().entry_type();
            if kind.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }
            if kind.is_hard_link() {
                return Err(ContainerError::Malformed(format!(
                    "Hard link {} is not supported",
                    rel.display()
                )));
            }
            if kind.is_symlink() {
                let link = entry.link_name()?.map(|l| l.into_owned()).unwrap_or_default();
                if link.is_absolute() || link.components().any(|c| c == Component::ParentDir) {
                    return Err(ContainerError::Malformed(format!(
                        "Link {} points outside its variant",
                        rel.display()
                    )));
                }
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            entry.unpack(&target)?;
            written.push(target);
        }

        Ok(written)
    }
}

/// Writes containers. Used by packaging scripts and tests.
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    manifest: serde_json::Value,
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl ContainerBuilder {
    pub fn new(manifest: &ModuleManifest) -> Self {
        Self {
            manifest: serde_json::to_value(manifest).unwrap_or_default(),
            files: Vec::new(),
        }
    }

    /// Add `contents` at `variants/<tag>/<rel_path>`.
    pub fn file(mut self, tag: &str, rel_path: &str, contents: impl Into<Vec<u8>>) -> Self {
        let path = Path::new(VARIANTS_DIR).join(tag).join(rel_path);
        self.files.push((path, contents.into()));
        self
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let manifest = serde_json::to_vec_pretty(&self.manifest)?;
        append(&mut builder, Path::new(MANIFEST_FILE), &manifest)?;
        for (path, contents) in &self.files {
            append(&mut builder, path, contents)?;
        }

        builder.into_inner()?.finish()?.flush()
    }
}

fn append<W: Write>(builder: &mut tar::Builder<W>, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder.append_data(&mut header, path, contents)
}
