//! Reporter trait for dependency injection
//!
//! The engine never prints. Progress and the host notifications
//! ("artifact ready to load", "batch finished") flow through this trait so
//! a CLI, a GUI host or a test can observe them.

use std::path::Path;

use lgpm_schema::{ModuleType, PackageName};

use crate::orchestrator::{BatchSummary, PackageReport, RequestId};

pub trait Reporter: Send + Sync {
    /// A request became active and its dependency-expanded queue is known.
    fn resolved(&self, request: RequestId, order: &[PackageName]);

    /// Work on package `index` (0-based) of `total` begins.
    fn package_started(&self, name: &PackageName, index: usize, total: usize);

    /// Updates the progress of a download.
    fn downloading(&self, name: &PackageName, current: u64, total: Option<u64>);

    /// An entry-point library was copied into place and can be loaded.
    fn artifact_installed(&self, path: &Path, module_type: ModuleType);

    /// One package finished (installed, skipped or failed).
    fn package_finished(&self, report: &PackageReport);

    /// The whole batch of a request finished.
    fn batch_finished(&self, summary: &BatchSummary);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn resolved(&self, request: RequestId, order: &[PackageName]) {
        (**self).resolved(request, order);
    }
    fn package_started(&self, name: &PackageName, index: usize, total: usize) {
        (**self).package_started(name, index, total);
    }
    fn downloading(&self, name: &PackageName, current: u64, total: Option<u64>) {
        (**self).downloading(name, current, total);
    }
    fn artifact_installed(&self, path: &Path, module_type: ModuleType) {
        (**self).artifact_installed(path, module_type);
    }
    fn package_finished(&self, report: &PackageReport) {
        (**self).package_finished(report);
    }
    fn batch_finished(&self, summary: &BatchSummary) {
        (**self).batch_finished(summary);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn resolved(&self, _: RequestId, _: &[PackageName]) {}
    fn package_started(&self, _: &PackageName, _: usize, _: usize) {}
    fn downloading(&self, _: &PackageName, _: u64, _: Option<u64>) {}
    fn artifact_installed(&self, _: &Path, _: ModuleType) {}
    fn package_finished(&self, _: &PackageReport) {}
    fn batch_finished(&self, _: &BatchSummary) {}
    fn warning(&self, _: &str) {}
}
