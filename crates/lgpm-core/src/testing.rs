//! Fixtures shared by the unit tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lgpm_schema::{CpuArch, ModuleManifest, ModuleType, OsFamily, PackageName, Platform};
use tempfile::TempDir;

use crate::config::{Config, HttpConfig};
use crate::context::Context;
use crate::install::Installer;
use crate::io::container::ContainerBuilder;
use crate::orchestrator::{BatchSummary, PackageReport, RequestId};
use crate::reporter::Reporter;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Resolved(RequestId, Vec<PackageName>),
    Started(PackageName),
    Artifact(PathBuf, ModuleType),
    Finished(PackageReport),
    Batch(BatchSummary),
    Warning(String),
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn artifacts(&self) -> Vec<(PathBuf, ModuleType)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Artifact(path, t) => Some((path, t)),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Warning(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    pub fn batches(&self) -> Vec<BatchSummary> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Batch(b) => Some(b),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn resolved(&self, request: RequestId, order: &[PackageName]) {
        self.push(Event::Resolved(request, order.to_vec()));
    }
    fn package_started(&self, name: &PackageName, _: usize, _: usize) {
        self.push(Event::Started(name.clone()));
    }
    fn downloading(&self, _: &PackageName, _: u64, _: Option<u64>) {}
    fn artifact_installed(&self, path: &Path, module_type: ModuleType) {
        self.push(Event::Artifact(path.to_path_buf(), module_type));
    }
    fn package_finished(&self, report: &PackageReport) {
        self.push(Event::Finished(report.clone()));
    }
    fn batch_finished(&self, summary: &BatchSummary) {
        self.push(Event::Batch(summary.clone()));
    }
    fn warning(&self, msg: &str) {
        self.push(Event::Warning(msg.to_string()));
    }
}

pub fn manifest(name: &str, version: &str, module_type: &str, main: &[(&str, &str)]) -> ModuleManifest {
    ModuleManifest {
        name: name.into(),
        version: version.into(),
        description: format!("{name} module"),
        type_: module_type.into(),
        main: main
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<BTreeMap<_, _>>(),
        ..ModuleManifest::default()
    }
}

/// Sorted entry names of `dir`; empty when it does not exist.
pub fn read_dir_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Temporary module directories plus a recording reporter, on linux-x86_64.
pub struct Fixture {
    _tmp: TempDir,
    pub root: PathBuf,
    pub modules: PathBuf,
    pub plugins: PathBuf,
    pub scratch: PathBuf,
    pub reporter: Arc<RecordingReporter>,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        Self {
            modules: root.join("host/modules"),
            plugins: root.join("host/plugins"),
            scratch: root.join("scratch"),
            root,
            _tmp: tmp,
            reporter: Arc::new(RecordingReporter::default()),
        }
    }

    pub fn config(&self, releases_url: &str) -> Config {
        Config {
            modules_dir: Some(self.modules.clone()),
            ui_plugins_dir: None,
            releases_url: releases_url.to_string(),
            http: HttpConfig {
                max_retries: 0,
                retry_backoff_ms: 1,
                ..HttpConfig::default()
            },
            ..Config::default()
        }
    }

    pub fn context(&self, releases_url: &str) -> Context {
        Context::new(self.config(releases_url), self.reporter.clone())
            .unwrap()
            .with_platform(Platform::new(OsFamily::Linux, CpuArch::X86_64))
            .with_scratch_root(&self.scratch)
    }

    pub fn installer(&self) -> Installer {
        Installer::new(self.context("http://127.0.0.1:9"))
    }

    /// Write a container whose files contain their own relative path.
    pub fn container(&self, file: &str, manifest: &ModuleManifest, files: &[(&str, &str)]) -> PathBuf {
        let path = self.root.join("containers").join(file);
        files
            .iter()
            .fold(ContainerBuilder::new(manifest), |b, (tag, rel)| {
                b.file(tag, rel, rel.as_bytes().to_vec())
            })
            .write_to(&path)
            .unwrap();
        path
    }
}
