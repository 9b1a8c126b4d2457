//! Install orchestrator.
//!
//! Serializes install requests. A single actor task owns the FIFO of pending
//! requests and the state of the active batch; every batch runs in its own
//! worker task which reports progress back to the actor over the same
//! channel. At most one batch is active at any time, and a request submitted
//! while another is running waits until that batch (dependencies included)
//! has completely finished.
//!
//! ```text
//! Idle -> ResolvingDependencies -> FetchingCatalog -> DownloadingPackageFile
//!      -> InstallingPackage -> AdvanceToNextPackage -> (FetchingCatalog ...)
//!      -> AdvanceToNextRequest -> Idle | ResolvingDependencies
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use lgpm_schema::PackageName;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::catalog::CatalogClient;
use crate::context::Context;
use crate::error::PackageError;
use crate::install::{InstallOptions, InstallOutcome, Installer};
use crate::resolver;

/// Identifies one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    ResolvingDependencies,
    FetchingCatalog,
    DownloadingPackageFile,
    InstallingPackage,
    AdvanceToNextPackage,
    AdvanceToNextRequest,
}

/// Resolution state of the active request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveBatch {
    pub request: RequestId,
    pub requested: Vec<PackageName>,
    pub package_queue: Vec<PackageName>,
    pub current_index: usize,
    pub files_to_download: Vec<String>,
    pub downloaded_files: Vec<String>,
}

impl ActiveBatch {
    fn new(request: &InstallRequest) -> Self {
        Self {
            request: request.id,
            requested: request.names.clone(),
            package_queue: Vec::new(),
            current_index: 0,
            files_to_download: Vec::new(),
            downloaded_files: Vec::new(),
        }
    }

    fn apply(&mut self, event: BatchEvent) -> Option<Phase> {
        match event {
            BatchEvent::Phase(phase) => return Some(phase),
            BatchEvent::Resolved(queue) => {
                self.package_queue = queue;
                self.current_index = 0;
            }
            BatchEvent::PackageStarted(index) => {
                self.current_index = index;
                self.files_to_download.clear();
                self.downloaded_files.clear();
            }
            BatchEvent::FileQueued(file) => self.files_to_download.push(file),
            BatchEvent::FileDownloaded(file) => {
                self.files_to_download.retain(|f| *f != file);
                self.downloaded_files.push(file);
            }
        }
        None
    }
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub phase: Phase,
    pub active: Option<ActiveBatch>,
    /// Requests waiting behind the active one, in submission order.
    pub pending: Vec<RequestId>,
}

impl StatusSnapshot {
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }
}

/// Completion of one package within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    pub request: RequestId,
    pub name: PackageName,
    pub success: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PackageReport {
    fn new(request: RequestId, name: &PackageName, result: Result<InstallOutcome, PackageError>) -> Self {
        let mut report = Self {
            request,
            name: name.clone(),
            success: false,
            skipped: false,
            version: None,
            installed_dir: None,
            error: None,
        };
        match result {
            Ok(InstallOutcome::Installed(module)) => {
                report.success = true;
                report.version = Some(module.version);
                report.installed_dir = Some(module.dir);
            }
            Ok(InstallOutcome::Skipped {
                installed_version, ..
            }) => {
                report.success = true;
                report.skipped = true;
                report.version = Some(installed_version);
            }
            Err(e) => report.error = Some(e.to_string()),
        }
        report
    }
}

/// Completion of a whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub request: RequestId,
    pub requested: Vec<PackageName>,
    /// Dependency-expanded install order.
    pub order: Vec<PackageName>,
    pub packages: Vec<PackageReport>,
}

impl BatchSummary {
    pub fn installed(&self) -> usize {
        self.packages.iter().filter(|p| p.success && !p.skipped).count()
    }

    pub fn skipped(&self) -> usize {
        self.packages.iter().filter(|p| p.skipped).count()
    }

    pub fn failed(&self) -> usize {
        self.packages.iter().filter(|p| !p.success).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

struct InstallRequest {
    id: RequestId,
    names: Vec<PackageName>,
    options: InstallOptions,
    done: Option<oneshot::Sender<BatchSummary>>,
}

enum BatchEvent {
    Phase(Phase),
    Resolved(Vec<PackageName>),
    PackageStarted(usize),
    FileQueued(String),
    FileDownloaded(String),
}

/// Messages handled by the orchestrator actor
enum OrchestratorEvent {
    Submit(InstallRequest),
    Status(oneshot::Sender<StatusSnapshot>),
    WaitIdle(oneshot::Sender<()>),
    Progress {
        request: RequestId,
        event: BatchEvent,
    },
    BatchDone {
        summary: BatchSummary,
        done: Option<oneshot::Sender<BatchSummary>>,
    },
    Shutdown(oneshot::Sender<()>),
}

/// A handle to the orchestrator actor. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    sender: mpsc::UnboundedSender<OrchestratorEvent>,
    next_id: Arc<AtomicU64>,
    closing: Arc<AtomicBool>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("closed", &self.sender.is_closed())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Spawn the actor on the current tokio runtime.
    pub fn spawn(ctx: Context) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = Actor {
            receiver,
            sender: sender.downgrade(),
            installer: Installer::new(ctx),
            queue: VecDeque::new(),
            active: None,
            phase: Phase::Idle,
            idle_waiters: Vec::new(),
            shutdown: None,
        };
        tokio::spawn(actor.run());

        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
            closing: Arc::new(AtomicBool::new(false)),
        }
    }

    fn enqueue(
        &self,
        names: Vec<PackageName>,
        options: InstallOptions,
        done: Option<oneshot::Sender<BatchSummary>>,
    ) -> Result<RequestId, PackageError> {
        if self.closing.load(Ordering::Acquire) {
            return Err(PackageError::Shutdown);
        }
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = InstallRequest {
            id,
            names,
            options,
            done,
        };
        self.sender
            .send(OrchestratorEvent::Submit(request))
            .map_err(|_| PackageError::Shutdown)?;
        Ok(id)
    }

    /// Queue an install request. Never blocks; a request submitted while
    /// another batch is running starts after it. Fails once shutdown has
    /// been requested.
    pub fn submit(
        &self,
        names: Vec<PackageName>,
        options: InstallOptions,
    ) -> Result<RequestId, PackageError> {
        self.enqueue(names, options, None)
    }

    /// Queue an install request and wait for its batch to finish.
    pub async fn install(
        &self,
        names: Vec<PackageName>,
        options: InstallOptions,
    ) -> Result<BatchSummary, PackageError> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(names, options, Some(tx))?;
        rx.await.map_err(|_| PackageError::Shutdown)
    }

    /// Helper to send a request and wait for the response
    async fn request<T, F>(&self, f: F) -> Result<T, PackageError>
    where
        F: FnOnce(oneshot::Sender<T>) -> OrchestratorEvent,
    {
        let (tx, rx) = oneshot::channel();
        self.sender.send(f(tx)).map_err(|_| PackageError::Shutdown)?;
        rx.await.map_err(|_| PackageError::Shutdown)
    }

    pub async fn status(&self) -> Result<StatusSnapshot, PackageError> {
        self.request(OrchestratorEvent::Status).await
    }

    /// Resolves once no batch is active and nothing is queued.
    pub async fn wait_idle(&self) -> Result<(), PackageError> {
        self.request(OrchestratorEvent::WaitIdle).await
    }

    /// Let the active batch finish, drop queued requests and stop the actor.
    pub async fn shutdown(&self) -> Result<(), PackageError> {
        self.closing.store(true, Ordering::Release);
        self.request(OrchestratorEvent::Shutdown).await
    }
}

struct Actor {
    receiver: mpsc::UnboundedReceiver<OrchestratorEvent>,
    sender: mpsc::WeakUnboundedSender<OrchestratorEvent>,
    installer: Installer,
    queue: VecDeque<InstallRequest>,
    active: Option<ActiveBatch>,
    phase: Phase,
    idle_waiters: Vec<oneshot::Sender<()>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Actor {
    async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            match event {
                OrchestratorEvent::Submit(request) => {
                    if self.shutdown.is_some() {
                        self.reject(&request);
                        continue;
                    }
                    tracing::debug!("Queued request {} {:?}", request.id, request.names);
                    self.queue.push_back(request);
                    if self.active.is_none() {
                        self.start_next();
                    }
                }
                OrchestratorEvent::Status(reply) => {
                    reply.send(self.snapshot()).ok();
                }
                OrchestratorEvent::WaitIdle(reply) => {
                    if self.active.is_none() && self.queue.is_empty() {
                        reply.send(()).ok();
                    } else {
                        self.idle_waiters.push(reply);
                    }
                }
                OrchestratorEvent::Progress { request, event } => {
                    if let Some(active) = self.active.as_mut().filter(|a| a.request == request) {
                        if let Some(phase) = active.apply(event) {
                            self.phase = phase;
                        }
                    }
                }
                OrchestratorEvent::BatchDone { summary, done } => {
                    self.phase = Phase::AdvanceToNextRequest;
                    self.active = None;
                    tracing::info!(
                        "Request {} finished: {} installed, {} skipped, {} failed",
                        summary.request,
                        summary.installed(),
                        summary.skipped(),
                        summary.failed()
                    );
                    self.installer.context().reporter.batch_finished(&summary);
                    if let Some(done) = done {
                        done.send(summary).ok();
                    }

                    if let Some(reply) = self.shutdown.take() {
                        self.finish_shutdown(reply);
                        return;
                    }
                    self.start_next();
                }
                OrchestratorEvent::Shutdown(reply) => {
                    for request in std::mem::take(&mut self.queue) {
                        self.reject(&request);
                    }
                    if self.active.is_none() {
                        self.finish_shutdown(reply);
                        return;
                    }
                    self.shutdown = Some(reply);
                }
            }
        }
    }

    /// Drop a request that will never run. Its `install` caller sees
    /// `PackageError::Shutdown`.
    fn reject(&self, request: &InstallRequest) {
        let msg = format!(
            "Request {} ({:?}) dropped: install engine is shutting down",
            request.id, request.names
        );
        tracing::warn!("{msg}");
        self.installer.context().reporter.warning(&msg);
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.phase,
            active: self.active.clone(),
            pending: self.queue.iter().map(|r| r.id).collect(),
        }
    }

    fn finish_shutdown(&mut self, reply: oneshot::Sender<()>) {
        self.phase = Phase::Idle;
        for waiter in self.idle_waiters.drain(..) {
            waiter.send(()).ok();
        }
        reply.send(()).ok();
        tracing::debug!("Orchestrator stopped");
    }

    /// Promote the next queued request, or go idle.
    fn start_next(&mut self) {
        let Some(request) = self.queue.pop_front() else {
            self.phase = Phase::Idle;
            for waiter in self.idle_waiters.drain(..) {
                waiter.send(()).ok();
            }
            return;
        };

        // Every handle is gone; nobody is left to observe the result.
        let Some(sender) = self.sender.upgrade() else {
            self.queue.clear();
            self.phase = Phase::Idle;
            return;
        };

        self.active = Some(ActiveBatch::new(&request));
        self.phase = Phase::ResolvingDependencies;
        tokio::spawn(run_batch(self.installer.clone(), request, sender));
    }
}

/// Worker side of one batch. Talks to the actor only through `sender`.
async fn run_batch(
    installer: Installer,
    request: InstallRequest,
    sender: mpsc::UnboundedSender<OrchestratorEvent>,
) {
    let InstallRequest {
        id,
        names,
        options,
        done,
    } = request;
    let progress = |event| {
        sender
            .send(OrchestratorEvent::Progress { request: id, event })
            .ok();
    };
    let ctx = installer.context();
    let reporter = &ctx.reporter;
    let catalog_client = ctx.catalog_client();
    let mut packages = Vec::new();
    let mut order = Vec::new();

    progress(BatchEvent::Phase(Phase::ResolvingDependencies));
    match catalog_client.fetch().await {
        Err(e) => {
            let message = PackageError::from(e).to_string();
            reporter.warning(&message);
            for name in &names {
                let report = PackageReport {
                    error: Some(message.clone()),
                    ..PackageReport::new(id, name, Err(PackageError::NotFound(name.clone())))
                };
                reporter.package_finished(&report);
                packages.push(report);
            }
        }
        Ok(catalog) => {
            let resolution = resolver::resolve(&names, &catalog);
            for warning in &resolution.warnings {
                reporter.warning(warning);
            }
            for name in &resolution.missing {
                let report = PackageReport::new(id, name, Err(PackageError::NotFound(name.clone())));
                reporter.package_finished(&report);
                packages.push(report);
            }

            order = resolution.order;
            progress(BatchEvent::Resolved(order.clone()));
            reporter.resolved(id, &order);

            for (index, name) in order.iter().enumerate() {
                progress(BatchEvent::PackageStarted(index));
                reporter.package_started(name, index, order.len());

                let result = install_package(&installer, &catalog_client, name, options, &progress).await;
                if let Err(e) = &result {
                    tracing::warn!("Failed to install {name}: {e}");
                }
                let report = PackageReport::new(id, name, result);
                reporter.package_finished(&report);
                packages.push(report);

                progress(BatchEvent::Phase(Phase::AdvanceToNextPackage));
            }
        }
    }

    progress(BatchEvent::Phase(Phase::AdvanceToNextRequest));
    let summary = BatchSummary {
        request: id,
        requested: names,
        order,
        packages,
    };
    sender.send(OrchestratorEvent::BatchDone { summary, done }).ok();
}

/// Refetch the catalog, then download and install one package.
async fn install_package(
    installer: &Installer,
    catalog_client: &CatalogClient,
    name: &PackageName,
    options: InstallOptions,
    progress: &impl Fn(BatchEvent),
) -> Result<InstallOutcome, PackageError> {
    progress(BatchEvent::Phase(Phase::FetchingCatalog));
    let catalog = catalog_client.fetch().await?;
    let record = catalog
        .find(name)
        .ok_or_else(|| PackageError::NotFound(name.clone()))?;

    progress(BatchEvent::FileQueued(record.container_file.clone()));
    progress(BatchEvent::Phase(Phase::DownloadingPackageFile));
    let downloaded = installer.download(record).await?;
    progress(BatchEvent::FileDownloaded(record.container_file.clone()));

    progress(BatchEvent::Phase(Phase::InstallingPackage));
    installer
        .install_container_async(downloaded.path(), record.module_type, options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, Fixture, manifest};
    use mockito::{Mock, Server, ServerGuard};

    fn names(list: &[&str]) -> Vec<PackageName> {
        list.iter().map(|n| PackageName::from(*n)).collect()
    }

    fn catalog_json(entries: &[(&str, &[&str])]) -> String {
        let records: Vec<serde_json::Value> = entries
            .iter()
            .map(|(name, deps)| {
                serde_json::json!({
                    "name": name,
                    "description": format!("{name} module"),
                    "category": "Test",
                    "type": "core",
                    "moduleName": name,
                    "dependencies": deps,
                    "package": format!("{name}.lgx"),
                })
            })
            .collect();
        serde_json::to_string(&records).unwrap()
    }

    async fn serve_container(server: &mut ServerGuard, fx: &Fixture, name: &str) -> Mock {
        let library = format!("{name}.so");
        let path = fx.container(
            &format!("{name}.lgx"),
            &manifest(name, "1.0.0", "core", &[]),
            &[("linux-x86_64", library.as_str())],
        );
        server
            .mock("GET", format!("/latest/download/{name}.lgx").as_str())
            .with_status(200)
            .with_body(std::fs::read(path).unwrap())
            .create_async()
            .await
    }

    async fn serve_catalog(server: &mut ServerGuard, body: String) -> Mock {
        server
            .mock("GET", "/latest/download/list.json")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    fn started(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Started(n) => Some(n.to_string()),
                Event::Batch(b) => Some(format!("done {}", b.request)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_queued_request_waits_for_whole_batch() {
        let fx = Fixture::new();
        let mut server = Server::new_async().await;
        let _catalog = serve_catalog(
            &mut server,
            catalog_json(&[("a", &["a_dep"]), ("a_dep", &[]), ("b", &[])]),
        )
        .await;
        let mut mocks = Vec::new();
        for name in ["a", "a_dep", "b"] {
            mocks.push(serve_container(&mut server, &fx, name).await);
        }

        let orchestrator = Orchestrator::spawn(fx.context(&server.url()));
        let first = orchestrator
            .submit(names(&["a"]), InstallOptions::default())
            .unwrap();
        let second = orchestrator
            .submit(names(&["b"]), InstallOptions::default())
            .unwrap();
        orchestrator.wait_idle().await.unwrap();

        assert_eq!(
            started(&fx.reporter.events()),
            vec![
                "a_dep".to_string(),
                "a".to_string(),
                format!("done {first}"),
                "b".to_string(),
                format!("done {second}"),
            ]
        );

        let batches = fx.reporter.batches();
        assert_eq!(batches[0].order, names(&["a_dep", "a"]));
        assert!(batches.iter().all(BatchSummary::is_success));
        assert!(fx.modules.join("a_dep/a_dep.so").is_file());
        assert!(fx.modules.join("b/manifest.json").is_file());

        let status = orchestrator.status().await.unwrap();
        assert_eq!(status.phase, Phase::Idle);
        assert!(status.is_idle());
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_siblings() {
        let fx = Fixture::new();
        let mut server = Server::new_async().await;
        let _catalog = serve_catalog(
            &mut server,
            catalog_json(&[("app", &["broken", "good"]), ("broken", &[]), ("good", &[])]),
        )
        .await;
        let _good = serve_container(&mut server, &fx, "good").await;
        let _app = serve_container(&mut server, &fx, "app").await;
        let _broken = server
            .mock("GET", "/latest/download/broken.lgx")
            .with_status(404)
            .create_async()
            .await;

        let orchestrator = Orchestrator::spawn(fx.context(&server.url()));
        let summary = orchestrator
            .install(names(&["ghost", "app"]), InstallOptions::default())
            .await
            .unwrap();

        let outcome: Vec<(&str, bool)> = summary
            .packages
            .iter()
            .map(|p| (p.name.as_str(), p.success))
            .collect();
        assert_eq!(
            outcome,
            vec![("ghost", false), ("broken", false), ("good", true), ("app", true)]
        );
        assert!(summary.packages[0].error.as_deref().unwrap().contains("not found"));
        assert!(!summary.is_success());
        assert_eq!(summary.failed(), 2);
        assert!(fx.modules.join("good").is_dir());
        assert!(!fx.modules.join("broken").exists());
    }

    #[tokio::test]
    async fn test_catalog_failure_fails_every_requested_package() {
        let fx = Fixture::new();
        let mut server = Server::new_async().await;
        let _catalog = server
            .mock("GET", "/latest/download/list.json")
            .with_status(500)
            .create_async()
            .await;

        let orchestrator = Orchestrator::spawn(fx.context(&server.url()));
        let summary = orchestrator
            .install(names(&["a", "b"]), InstallOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.failed(), 2);
        assert!(summary.order.is_empty());
        assert!(
            summary.packages[0]
                .error
                .as_deref()
                .unwrap()
                .contains("catalog")
        );
    }

    #[tokio::test]
    async fn test_skip_policy_reported_as_skipped() {
        let fx = Fixture::new();
        let installed = fx.modules.join("a");
        std::fs::create_dir_all(&installed).unwrap();
        std::fs::write(
            installed.join("manifest.json"),
            r#"{"name": "a", "version": "2.0.0"}"#,
        )
        .unwrap();

        let mut server = Server::new_async().await;
        let _catalog = serve_catalog(&mut server, catalog_json(&[("a", &[])])).await;
        let _a = serve_container(&mut server, &fx, "a").await;

        let orchestrator = Orchestrator::spawn(fx.context(&server.url()));
        let summary = orchestrator
            .install(
                names(&["a"]),
                InstallOptions {
                    skip_if_not_newer: true,
                },
            )
            .await
            .unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.packages[0].version.as_deref(), Some("2.0.0"));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_work() {
        let fx = Fixture::new();
        let orchestrator = Orchestrator::spawn(fx.context("http://127.0.0.1:9"));
        orchestrator.shutdown().await.unwrap();

        // The actor has exited; its receiver is gone.
        tokio::task::yield_now().await;
        assert!(matches!(
            orchestrator.submit(names(&["a"]), InstallOptions::default()),
            Err(PackageError::Shutdown)
        ));
        assert!(matches!(
            orchestrator.status().await,
            Err(PackageError::Shutdown)
        ));
    }

    #[tokio::test]
    async fn test_submit_during_shutdown_is_rejected() {
        let fx = Fixture::new();
        let mut server = Server::new_async().await;
        let _catalog = serve_catalog(&mut server, catalog_json(&[("a", &[])])).await;
        let _a = serve_container(&mut server, &fx, "a").await;

        let orchestrator = Orchestrator::spawn(fx.context(&server.url()));
        orchestrator
            .submit(names(&["a"]), InstallOptions::default())
            .unwrap();

        let mut stop = Box::pin(orchestrator.shutdown());
        let _ = futures::poll!(stop.as_mut());
        assert!(matches!(
            orchestrator.submit(names(&["a"]), InstallOptions::default()),
            Err(PackageError::Shutdown)
        ));
        stop.await.unwrap();

        // The batch that was already running still completes.
        let batches = fx.reporter.batches();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_success());
    }

    #[test]
    fn test_active_batch_tracks_downloads() {
        let request = InstallRequest {
            id: RequestId(7),
            names: names(&["a"]),
            options: InstallOptions::default(),
            done: None,
        };
        let mut batch = ActiveBatch::new(&request);

        assert_eq!(batch.apply(BatchEvent::Resolved(names(&["dep", "a"]))), None);
        batch.apply(BatchEvent::PackageStarted(1));
        batch.apply(BatchEvent::FileQueued("a.lgx".into()));
        assert_eq!(batch.files_to_download, vec!["a.lgx"]);
        batch.apply(BatchEvent::FileDownloaded("a.lgx".into()));
        assert!(batch.files_to_download.is_empty());
        assert_eq!(batch.downloaded_files, vec!["a.lgx"]);
        assert_eq!(batch.current_index, 1);
        assert_eq!(
            batch.apply(BatchEvent::Phase(Phase::InstallingPackage)),
            Some(Phase::InstallingPackage)
        );
    }
}
