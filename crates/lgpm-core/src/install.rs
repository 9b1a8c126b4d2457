//! Install engine.
//!
//! Installs one resolved package: download the container, pick the variant
//! for the running platform, optionally skip when an equal or newer version
//! is already installed, extract, stage a full copy next to the target and
//! swap it into `<base>/<moduleName>`. The previous install is only touched
//! once the new tree has been copied completely.
//!
//! All filesystem work is blocking and runs on the blocking pool when called
//! through [`Installer::install_container_async`].

use std::fs;
use std::path::{Component, Path, PathBuf};

use lgpm_schema::{MANIFEST_FILE, ModuleManifest, ModuleType, PackageRecord, version_ge};
use serde::Serialize;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::catalog::installed_version;
use crate::context::Context;
use crate::error::PackageError;
use crate::io::container::ContainerError;
use crate::io::download::DownloadRequest;
use crate::paths::filename_from_url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Skip the install when the installed version is the same or newer.
    pub skip_if_not_newer: bool,
}

/// A module copied into place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledModule {
    pub name: String,
    pub version: String,
    pub module_type: ModuleType,
    pub variant: String,
    pub dir: PathBuf,
    /// Absolute path of the entry-point library, if it exists on disk.
    pub entry_point: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed(InstalledModule),
    /// The installed copy is the same version or newer; nothing was written.
    Skipped {
        name: String,
        installed_version: String,
        candidate_version: String,
    },
}

impl InstallOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Installed(m) => &m.name,
            Self::Skipped { name, .. } => name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Self::Installed(m) => &m.version,
            Self::Skipped {
                candidate_version, ..
            } => candidate_version,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// A downloaded container. The temporary directory holding it is removed
/// on drop.
#[derive(Debug)]
pub struct DownloadedContainer {
    _dir: TempDir,
    path: PathBuf,
}

impl DownloadedContainer {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone)]
pub struct Installer {
    ctx: Context,
}

impl Installer {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Download and install a catalog record.
    pub async fn install_one(
        &self,
        record: &PackageRecord,
        options: InstallOptions,
    ) -> Result<InstallOutcome, PackageError> {
        let downloaded = self.download(record).await?;
        self.install_container_async(downloaded.path(), record.module_type, options)
            .await
    }

    /// Download a record's container into a fresh temporary directory.
    pub async fn download(&self, record: &PackageRecord) -> Result<DownloadedContainer, PackageError> {
        if record.container_file.trim().is_empty() {
            return Err(PackageError::MissingContainer(record.name.clone()));
        }

        fs::create_dir_all(&self.ctx.scratch_root)?;
        let dir = tempfile::Builder::new()
            .prefix("lgpm-download-")
            .tempdir_in(&self.ctx.scratch_root)?;

        let file_name = match filename_from_url(&record.container_file) {
            "" => "container.lgx",
            name => name,
        };
        let dest = dir.path().join(file_name);
        let url = self.ctx.config.container_url(&record.container_file);
        tracing::debug!("Downloading {} from {url}", record.name);

        let file = DownloadRequest::new(
            &self.ctx.client,
            &self.ctx.config.http,
            &record.name,
            &url,
            &dest,
            &self.ctx.reporter,
        )
        .with_expected_hash(record.sha256.as_deref())
        .execute()
        .await
        .map_err(|source| PackageError::Download {
            name: record.name.clone(),
            source,
        })?;

        tracing::debug!(
            "Downloaded {} ({} bytes, sha256 {})",
            record.name,
            file.size,
            file.sha256
        );
        Ok(DownloadedContainer {
            _dir: dir,
            path: file.path,
        })
    }

    /// [`install_container`](Self::install_container) on the blocking pool.
    pub async fn install_container_async(
        &self,
        path: &Path,
        module_type: ModuleType,
        options: InstallOptions,
    ) -> Result<InstallOutcome, PackageError> {
        let this = self.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || this.install_container(&path, module_type, options))
            .await
            .map_err(|e| PackageError::Io(std::io::Error::other(e)))?
    }

    /// Install a local container file, taking the module type from its
    /// manifest.
    pub fn install_file(
        &self,
        path: &Path,
        options: InstallOptions,
    ) -> Result<InstallOutcome, PackageError> {
        let container = self.ctx.codec.open(path)?;
        let module_type = ModuleType::from(container.manifest().type_.as_str());
        drop(container);
        self.install_container(path, module_type, options)
    }

    /// Install an already downloaded container into the directory for
    /// `module_type`.
    pub fn install_container(
        &self,
        path: &Path,
        module_type: ModuleType,
        options: InstallOptions,
    ) -> Result<InstallOutcome, PackageError> {
        let container = self.ctx.codec.open(path)?;

        let variants = self.ctx.platform.variants_to_try();
        let Some(variant) = variants.iter().find(|v| container.has_variant(v)).cloned() else {
            return Err(PackageError::UnsupportedPlatform {
                platform: self.ctx.platform.variant(),
                available: container.variants().join(", "),
            });
        };

        let meta = container.metadata();
        if options.skip_if_not_newer {
            if let Some(installed) = installed_version(&self.ctx.dirs.all(), &meta.name) {
                if version_ge(&installed, &meta.version) {
                    tracing::info!(
                        "Skipping {}: installed {installed} is not older than {}",
                        meta.name,
                        meta.version
                    );
                    return Ok(InstallOutcome::Skipped {
                        name: meta.name,
                        installed_version: installed,
                        candidate_version: meta.version,
                    });
                }
            }
        }

        fs::create_dir_all(&self.ctx.scratch_root)?;
        let scratch = tempfile::Builder::new()
            .prefix("lgpm-extract-")
            .tempdir_in(&self.ctx.scratch_root)?;
        let variant_dir = scratch.path().join(&variant);
        container.extract_variant(&variant, &variant_dir)?;
        fs::write(variant_dir.join(MANIFEST_FILE), container.manifest_json())?;

        let module_name = self.module_name(container.manifest(), &variant_dir)?;

        let base = self.ctx.dirs.for_type(module_type);
        fs::create_dir_all(base)?;
        let target = base.join(&module_name);
        stage_and_swap(&variant_dir, base, &target)?;

        let entry_file = entry_point_file(
            container.manifest(),
            &variant,
            &variants,
            &module_name,
            self.ctx.platform.library_suffix(),
        );
        let entry_path = target.join(entry_file);
        let entry_point = if entry_path.is_file() {
            self.ctx.reporter.artifact_installed(&entry_path, module_type);
            Some(entry_path)
        } else {
            tracing::warn!(
                "Entry point {} not found after installing {module_name}",
                entry_path.display()
            );
            None
        };

        tracing::info!(
            "Installed {module_name} {} ({variant}) into {}",
            meta.version,
            target.display()
        );

        Ok(InstallOutcome::Installed(InstalledModule {
            name: module_name,
            version: meta.version,
            module_type,
            variant,
            dir: target,
            entry_point,
        }))
    }

    /// On-disk module name: the manifest `name`, else the base name of the
    /// first library in the variant.
    fn module_name(&self, manifest: &ModuleManifest, variant_dir: &Path) -> Result<String, PackageError> {
        let name = if manifest.name.trim().is_empty() {
            let library = WalkDir::new(variant_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .find(|e| e.file_type().is_file() && self.ctx.platform.is_library_file(e.path()))
                .ok_or_else(|| {
                    ContainerError::Malformed("manifest has no name and no library found".into())
                })?;

            let file_name = library.file_name().to_string_lossy();
            let base = file_name.split('.').next().unwrap_or_default().to_string();
            let msg = format!("Manifest has no name, using library name '{base}'");
            tracing::warn!("{msg}");
            self.ctx.reporter.warning(&msg);
            base
        } else {
            manifest.name.trim().to_string()
        };

        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ContainerError::Malformed(format!("invalid module name '{name}'")).into());
        }
        Ok(name)
    }
}

/// `main[selected]`, then `main[t]` for the other acceptable tags, then
/// `<moduleName><suffix>`. A declared entry that would resolve outside the
/// module directory is ignored.
fn entry_point_file(
    manifest: &ModuleManifest,
    selected: &str,
    variants: &[String],
    module_name: &str,
    suffix: &str,
) -> String {
    let tags = std::iter::once(selected).chain(
        variants
            .iter()
            .map(String::as_str)
            .filter(|t| *t != selected),
    );
    match manifest.entry_point(tags) {
        Some(file) if is_inside_module(file) => file.to_string(),
        Some(file) => {
            tracing::warn!("Ignoring entry point '{file}' outside the module directory");
            format!("{module_name}{suffix}")
        }
        None => format!("{module_name}{suffix}"),
    }
}

/// Relative path made only of normal components.
fn is_inside_module(file: &str) -> bool {
    let path = Path::new(file);
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Copy `src` into a staging directory inside `base`, then swap it into
/// `target`. The previous `target` survives any failure.
fn stage_and_swap(src: &Path, base: &Path, target: &Path) -> Result<(), PackageError> {
    let staging = tempfile::Builder::new()
        .prefix(".lgpm-staging-")
        .tempdir_in(base)?;
    copy_tree(src, staging.path())?;

    let backup = if target.exists() || target.is_symlink() {
        let backup = tempfile::Builder::new()
            .prefix(".lgpm-previous-")
            .tempdir_in(base)?;
        let backup_path = backup.path().join("module");
        fs::rename(target, &backup_path).map_err(|source| PackageError::Copy {
            path: target.to_path_buf(),
            source,
        })?;
        Some((backup, backup_path))
    } else {
        None
    };

    let staged = staging.keep();
    if let Err(source) = fs::rename(&staged, target) {
        fs::remove_dir_all(&staged).ok();
        if let Some((_, backup_path)) = &backup {
            fs::rename(backup_path, target).ok();
        }
        return Err(PackageError::Copy {
            path: target.to_path_buf(),
            source,
        });
    }

    // The backup TempDir removes the previous install on drop.
    drop(backup);
    Ok(())
}

fn copy_tree(src: &Path, dest: &Path) -> Result<(), PackageError> {
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| PackageError::Copy {
            path: e.path().unwrap_or(src).to_path_buf(),
            source: e.into(),
        })?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let to = dest.join(rel);
        let copy_err = |source| PackageError::Copy {
            path: to.clone(),
            source,
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&to).map_err(copy_err)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &to).map_err(copy_err)?;
        } else {
            fs::copy(entry.path(), &to).map_err(copy_err)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, manifest, read_dir_names};

    #[test]
    fn test_installs_core_module_and_reports_entry_point() {
        let fx = Fixture::new();
        let path = fx.container(
            "waku.lgx",
            &manifest("waku", "1.0.0", "core", &[("linux-x86_64", "waku_plugin.so")]),
            &[("linux-x86_64", "waku_plugin.so"), ("linux-x86_64", "res/icon.png")],
        );

        let outcome = fx
            .installer()
            .install_container(&path, ModuleType::Core, InstallOptions::default())
            .unwrap();

        let InstallOutcome::Installed(module) = outcome else {
            panic!("expected an install");
        };
        let dir = fx.modules.join("waku");
        assert_eq!(module.dir, dir);
        assert_eq!(module.variant, "linux-x86_64");
        assert!(dir.join("res/icon.png").is_file());

        let written = ModuleManifest::load_from_dir(&dir).unwrap();
        assert_eq!(written.version, "1.0.0");

        let artifacts = fx.reporter.artifacts();
        assert_eq!(artifacts, vec![(dir.join("waku_plugin.so"), ModuleType::Core)]);
        assert_eq!(module.entry_point, Some(dir.join("waku_plugin.so")));

        // Nothing left behind besides the module itself.
        assert_eq!(read_dir_names(&fx.modules), vec!["waku"]);
        assert!(read_dir_names(&fx.scratch).is_empty());
    }

    #[test]
    fn test_ui_module_goes_to_plugins_dir() {
        let fx = Fixture::new();
        let path = fx.container(
            "chat_ui.lgx",
            &manifest("chat_ui", "0.1.0", "ui", &[]),
            &[("linux-amd64", "chat_ui.so")],
        );

        let outcome = fx
            .installer()
            .install_file(&path, InstallOptions::default())
            .unwrap();

        assert_eq!(outcome.name(), "chat_ui");
        // No `main` entry: falls back to `<moduleName><suffix>`, found via the alias tag.
        let expected = fx.plugins.join("chat_ui").join("chat_ui.so");
        assert_eq!(fx.reporter.artifacts(), vec![(expected, ModuleType::Ui)]);
        assert!(!fx.modules.join("chat_ui").exists());
    }

    #[test]
    fn test_skip_when_installed_is_newer() {
        let fx = Fixture::new();
        let installed = fx.modules.join("waku");
        fs::create_dir_all(&installed).unwrap();
        fs::write(
            installed.join(MANIFEST_FILE),
            r#"{"name": "waku", "version": "2.0.0"}"#,
        )
        .unwrap();
        fs::write(installed.join("waku_plugin.so"), b"v2").unwrap();

        let path = fx.container(
            "waku.lgx",
            &manifest("waku", "1.9.0", "core", &[("linux-x86_64", "waku_plugin.so")]),
            &[("linux-x86_64", "waku_plugin.so")],
        );
        let before = fs::metadata(installed.join(MANIFEST_FILE)).unwrap().modified().unwrap();

        let outcome = fx
            .installer()
            .install_container(
                &path,
                ModuleType::Core,
                InstallOptions {
                    skip_if_not_newer: true,
                },
            )
            .unwrap();

        assert_eq!(
            outcome,
            InstallOutcome::Skipped {
                name: "waku".into(),
                installed_version: "2.0.0".into(),
                candidate_version: "1.9.0".into(),
            }
        );
        assert_eq!(fs::read(installed.join("waku_plugin.so")).unwrap(), b"v2");
        let after = fs::metadata(installed.join(MANIFEST_FILE)).unwrap().modified().unwrap();
        assert_eq!(before, after);
        assert_eq!(read_dir_names(&fx.modules), vec!["waku"]);
        assert!(fx.reporter.artifacts().is_empty());
    }

    #[test]
    fn test_equal_version_is_skipped_newer_is_installed() {
        let fx = Fixture::new();
        let installed = fx.modules.join("waku");
        fs::create_dir_all(&installed).unwrap();
        fs::write(installed.join(MANIFEST_FILE), r#"{"name": "waku", "version": "1.2"}"#).unwrap();
        let opts = InstallOptions {
            skip_if_not_newer: true,
        };

        let same = fx.container(
            "same.lgx",
            &manifest("waku", "1.2.0", "core", &[]),
            &[("linux-x86_64", "waku.so")],
        );
        assert!(fx.installer().install_container(&same, ModuleType::Core, opts).unwrap().is_skipped());

        let newer = fx.container(
            "newer.lgx",
            &manifest("waku", "1.10", "core", &[]),
            &[("linux-x86_64", "waku.so")],
        );
        let outcome = fx.installer().install_container(&newer, ModuleType::Core, opts).unwrap();
        assert!(!outcome.is_skipped());
        assert_eq!(ModuleManifest::load_from_dir(&installed).unwrap().version, "1.10");
    }

    #[test]
    fn test_unsupported_platform_leaves_nothing_behind() {
        let fx = Fixture::new();
        let path = fx.container(
            "mac_only.lgx",
            &manifest("mac_only", "1.0.0", "core", &[]),
            &[("darwin-arm64", "mac_only.dylib")],
        );

        let err = fx
            .installer()
            .install_container(&path, ModuleType::Core, InstallOptions::default())
            .unwrap_err();

        match err {
            PackageError::UnsupportedPlatform { platform, available } => {
                assert_eq!(platform, "linux-x86_64");
                assert_eq!(available, "darwin-arm64");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!fx.modules.exists());
        assert!(read_dir_names(&fx.scratch).is_empty());
    }

    #[test]
    fn test_reinstall_replaces_previous_tree() {
        let fx = Fixture::new();
        let old = fx.modules.join("waku");
        fs::create_dir_all(&old).unwrap();
        fs::write(old.join("stale.so"), b"old").unwrap();

        let path = fx.container(
            "waku.lgx",
            &manifest("waku", "3.0.0", "core", &[]),
            &[("linux-x86_64", "waku.so")],
        );
        fx.installer()
            .install_container(&path, ModuleType::Core, InstallOptions::default())
            .unwrap();

        assert!(!old.join("stale.so").exists());
        assert!(old.join("waku.so").is_file());
        assert_eq!(read_dir_names(&fx.modules), vec!["waku"]);
    }

    #[test]
    fn test_module_name_falls_back_to_library() {
        let fx = Fixture::new();
        let path = fx.container(
            "anon.lgx",
            &manifest("", "1.0.0", "core", &[]),
            &[("linux-x86_64", "README"), ("linux-x86_64", "storage_module.so")],
        );

        let outcome = fx
            .installer()
            .install_container(&path, ModuleType::Core, InstallOptions::default())
            .unwrap();

        assert_eq!(outcome.name(), "storage_module");
        assert!(fx.modules.join("storage_module/storage_module.so").is_file());
        assert_eq!(fx.reporter.warnings().len(), 1);
    }

    #[test]
    fn test_entry_point_lookup_order() {
        let m = manifest(
            "x",
            "1",
            "core",
            &[("linux-amd64", "alias.so"), ("linux-x86_64", "")],
        );
        let variants = vec!["linux-x86_64".to_string(), "linux-amd64".to_string()];
        assert_eq!(
            entry_point_file(&m, "linux-x86_64", &variants, "x", ".so"),
            "alias.so"
        );
        assert_eq!(
            entry_point_file(&manifest("x", "1", "core", &[]), "linux-x86_64", &variants, "x", ".so"),
            "x.so"
        );
    }

    #[test]
    fn test_entry_point_outside_module_dir_is_ignored() {
        let fx = Fixture::new();
        let outside = fx.root.join("evil.so");
        fs::write(&outside, b"not yours").unwrap();
        let absolute = outside.to_string_lossy().into_owned();
        let expected = fx.modules.join("waku").join("waku.so");

        for (file, main) in [("abs.lgx", absolute.as_str()), ("up.lgx", "../../../evil.so")] {
            let path = fx.container(
                file,
                &manifest("waku", "1.0.0", "core", &[("linux-x86_64", main)]),
                &[("linux-x86_64", "waku.so")],
            );
            let outcome = fx
                .installer()
                .install_container(&path, ModuleType::Core, InstallOptions::default())
                .unwrap();

            let InstallOutcome::Installed(module) = outcome else {
                panic!("expected an install");
            };
            assert_eq!(module.entry_point, Some(expected.clone()));
        }

        assert_eq!(
            fx.reporter.artifacts(),
            vec![(expected.clone(), ModuleType::Core), (expected, ModuleType::Core)]
        );
        assert!(is_inside_module("lib/waku.so"));
        assert!(!is_inside_module(""));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_keeps_previous_install() {
        let fx = Fixture::new();
        let target = fx.modules.join("waku");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("waku.so"), b"v1").unwrap();

        let src = fx.root.join("extracted");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("waku.so"), b"v2").unwrap();
        // Sockets cannot be copied, so the copy fails after `waku.so`.
        let _socket = std::os::unix::net::UnixListener::bind(src.join("zz.sock")).unwrap();

        let err = stage_and_swap(&src, &fx.modules, &target).unwrap_err();
        assert!(matches!(err, PackageError::Copy { .. }));

        assert_eq!(fs::read(target.join("waku.so")).unwrap(), b"v1");
        assert_eq!(read_dir_names(&target), vec!["waku.so"]);
        // No staging or backup directories left next to the module.
        assert_eq!(read_dir_names(&fx.modules), vec!["waku"]);
    }

    #[tokio::test]
    async fn test_missing_container_file() {
        let fx = Fixture::new();
        let record = PackageRecord::new("ghost", ModuleType::Core);
        let err = fx
            .installer()
            .install_one(&record, InstallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PackageError::MissingContainer(_)));
    }
}
