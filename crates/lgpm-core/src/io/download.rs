//! Async HTTP transport: catalog GETs and streaming container downloads.
//!
//! Every request runs under the configured connect/request timeouts and is
//! retried with exponential backoff when the failure looks transient
//! (connection errors, timeouts, 5xx, 429). Downloads stream to disk while
//! hashing; a failed attempt never leaves a partial file behind.

use std::future::Future;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;
use crate::config::HttpConfig;
use lgpm_schema::PackageName;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

impl DownloadError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_body() || e.is_request(),
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Io(_) | Self::HashMismatch { .. } => false,
        }
    }
}

/// Build the shared HTTP client with the configured timeouts.
pub fn build_client(http: &HttpConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(crate::USER_AGENT)
        .connect_timeout(http.connect_timeout())
        .timeout(http.request_timeout())
        .build()
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
pub async fn with_retry<T, F, Fut>(http: &HttpConfig, url: &str, mut op: F) -> Result<T, DownloadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DownloadError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < http.max_retries => {
                let delay = http.backoff(attempt);
                tracing::warn!(
                    "Request to {url} failed ({e}), retrying in {}ms ({}/{})",
                    delay.as_millis(),
                    attempt + 1,
                    http.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn get_checked(client: &Client, url: &str) -> Result<reqwest::Response, DownloadError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            status,
            url: url.to_string(),
        });
    }
    Ok(response)
}

/// GET a small document (the catalog) fully into memory.
pub async fn fetch_bytes(
    client: &Client,
    http: &HttpConfig,
    url: &str,
) -> Result<Vec<u8>, DownloadError> {
    tracing::debug!("Fetching {url}");
    with_retry(http, url, || async {
        let response = get_checked(client, url).await?;
        Ok(response.bytes().await?.to_vec())
    })
    .await
}

/// A file fully written to disk.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub size: u64,
    /// Lowercase hex SHA-256 of the body.
    pub sha256: String,
}

/// Request for a download operation
pub struct DownloadRequest<'a, R: Reporter + ?Sized> {
    pub client: &'a Client,
    pub http: &'a HttpConfig,
    pub pkg_name: &'a PackageName,
    pub url: &'a str,
    pub dest: &'a Path,
    pub expected_hash: Option<&'a str>,
    pub reporter: &'a R,
}

impl<'a, R: Reporter + ?Sized> DownloadRequest<'a, R> {
    pub fn new(
        client: &'a Client,
        http: &'a HttpConfig,
        pkg_name: &'a PackageName,
        url: &'a str,
        dest: &'a Path,
        reporter: &'a R,
    ) -> Self {
        Self {
            client,
            http,
            pkg_name,
            url,
            dest,
            expected_hash: None,
            reporter,
        }
    }

    pub fn with_expected_hash(mut self, hash: Option<&'a str>) -> Self {
        self.expected_hash = hash.filter(|h| !h.is_empty());
        self
    }

    /// Execute the download, retrying transient failures.
    pub async fn execute(self) -> Result<DownloadedFile, DownloadError> {
        let result = with_retry(self.http, self.url, || self.attempt()).await;
        if result.is_err() {
            tokio::fs::remove_file(self.dest).await.ok();
        }
        result
    }

    async fn attempt(&self) -> Result<DownloadedFile, DownloadError> {
        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = get_checked(self.client, self.url).await?;
        let total = response.content_length();

        let mut file = File::create(self.dest).await?;
        let mut stream = response.bytes_stream();
        let mut hasher = Sha256::new();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    drop(file);
                    tokio::fs::remove_file(self.dest).await.ok();
                    return Err(e.into());
                }
            };
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
            self.reporter.downloading(self.pkg_name, downloaded, total);
        }
        file.flush().await?;

        let actual_hash = hex::encode(hasher.finalize());
        if let Some(expected) = self.expected_hash {
            if !actual_hash.eq_ignore_ascii_case(expected) {
                tokio::fs::remove_file(self.dest).await.ok();
                return Err(DownloadError::HashMismatch {
                    expected: expected.to_string(),
                    actual: actual_hash,
                });
            }
        }

        tracing::debug!(
            "Downloaded {} ({downloaded} bytes)",
            self.dest.display()
        );

        Ok(DownloadedFile {
            path: self.dest.to_path_buf(),
            size: downloaded,
            sha256: actual_hash,
        })
    }
}
