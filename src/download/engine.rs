//! Concurrent media downloading.
//!
//! A fixed set of `max_parallel` workers pulls descriptors from a bounded queue.
//! Each worker runs one descriptor's whole resolve/download/retry sequence before
//! taking the next, and stores the result in the slot matching the descriptor's
//! position, so the report keeps page order whatever order downloads finish in.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use md5::{Digest, Md5};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::Config;
use crate::download::report::{DownloadResult, RunReport};
use crate::download::retry::RetryPolicy;
use crate::error::{is_transient_status, DownloadError};
use crate::extractors::Extractor;
use crate::fetch::HttpClient;
use crate::fs::{claim, derive_filename, StagedFile};
use crate::media::MediaDescriptor;
use crate::output::{create_download_bar, create_item_bar, create_spinner};

/// Default number of concurrent downloads.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Download engine settings.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub max_parallel: usize,
    pub retry: RetryPolicy,
    /// Abort an attempt when no response or body bytes arrive for this long.
    pub read_timeout: Duration,
    pub show_progress: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            retry: RetryPolicy::default(),
            read_timeout: Duration::from_secs(30),
            show_progress: false,
        }
    }
}

impl DownloadOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_parallel: config.download.max_parallel.max(1),
            retry: RetryPolicy::from_config(config),
            read_timeout: config.read_timeout(),
            show_progress: config.download.show_progress,
        }
    }
}

/// Downloads descriptors into a destination directory.
pub struct DownloadEngine {
    client: HttpClient,
    options: DownloadOptions,
    cancel: CancellationToken,
    resolver: Option<Arc<dyn Extractor>>,
    progress: MultiProgress,
}

impl DownloadEngine {
    pub fn new(client: HttpClient, options: DownloadOptions) -> Self {
        let progress = if options.show_progress {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        Self {
            client,
            options,
            cancel: CancellationToken::new(),
            resolver: None,
            progress,
        }
    }

    /// Abort in-flight downloads when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Let `extractor` resolve each descriptor before it is downloaded.
    pub fn with_resolver(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.resolver = Some(extractor);
        self
    }

    /// Download every descriptor into `destination_dir`.
    ///
    /// Always returns a report with exactly one result per descriptor, in input order.
    pub async fn download_all(
        &self,
        descriptors: Vec<MediaDescriptor>,
        destination_dir: &Path,
    ) -> RunReport {
        let total = descriptors.len();
        if total == 0 {
            return RunReport::default();
        }

        if let Err(e) = tokio::fs::create_dir_all(destination_dir).await {
            tracing::error!(
                "Cannot create output directory {}: {}",
                destination_dir.display(),
                e
            );
            let error = DownloadError::from(e);
            return RunReport::from_results(
                descriptors
                    .into_iter()
                    .map(|d| DownloadResult::failed(d, error.clone(), 0))
                    .collect(),
            );
        }

        let workers = self.options.max_parallel.clamp(1, total);
        tracing::info!(
            "Downloading {} items with {} workers into {}",
            total,
            workers,
            destination_dir.display()
        );

        let slots: Mutex<Vec<Option<DownloadResult>>> = Mutex::new(vec![None; total]);
        let overall = self
            .progress
            .add(create_item_bar(total as u64, "Downloading"));

        let (tx, rx) = mpsc::channel::<(usize, MediaDescriptor)>(workers);
        let rx = tokio::sync::Mutex::new(rx);

        let slots_ref = &slots;
        let overall_ref = &overall;
        let rx_ref = &rx;

        let producer = async move {
            let mut jobs = descriptors.into_iter().enumerate();
            while let Some(job) = jobs.next() {
                let unsent = if self.cancel.is_cancelled() {
                    Some(job)
                } else {
                    tx.send(job).await.err().map(|e| e.0)
                };

                if let Some(first) = unsent {
                    // Never queued: record as skipped.
                    for (index, descriptor) in std::iter::once(first).chain(jobs.by_ref()) {
                        store(slots_ref, index, DownloadResult::cancelled(descriptor, 0));
                        overall_ref.inc(1);
                    }
                    break;
                }
            }
        };

        let pool = join_all((0..workers).map(move |_| async move {
            loop {
                let job = rx_ref.lock().await.recv().await;
                let Some((index, descriptor)) = job else {
                    break;
                };

                let result = if self.cancel.is_cancelled() {
                    DownloadResult::cancelled(descriptor, 0)
                } else {
                    self.process(index, descriptor, destination_dir).await
                };

                log_result(&result);
                overall_ref.inc(1);
                store(slots_ref, index, result);
            }
        }));

        tokio::join!(producer, pool);
        overall.finish_and_clear();

        let slots = match slots.into_inner() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };

        RunReport::from_results(slots.into_iter().flatten().collect())
    }

    /// Resolve, download and retry one descriptor.
    async fn process(
        &self,
        index: usize,
        descriptor: MediaDescriptor,
        destination_dir: &Path,
    ) -> DownloadResult {
        let mut attempts = 0;
        let work = self.run_item(index, &descriptor, destination_dir, &mut attempts);

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            outcome = work => Some(outcome),
        };

        // Publish outside the cancellation race: a finished file is always reported.
        match outcome {
            Some(Ok(staged)) => match staged.commit().await {
                Ok(path) => DownloadResult::success(descriptor, path, attempts),
                Err(e) => DownloadResult::failed(descriptor, e.into(), attempts),
            },
            Some(Err(err)) => DownloadResult::failed(descriptor, err, attempts),
            None => DownloadResult::cancelled(descriptor, attempts),
        }
    }

    async fn run_item(
        &self,
        index: usize,
        descriptor: &MediaDescriptor,
        destination_dir: &Path,
        attempts: &mut u32,
    ) -> Result<StagedFile, DownloadError> {
        let resolved = match &self.resolver {
            Some(extractor) => extractor
                .resolve(&self.client, descriptor.clone())
                .await
                .map_err(|e| match e {
                    DownloadError::Unresolved(_) => e,
                    other => DownloadError::Unresolved(other.to_string()),
                })?,
            None => descriptor.clone(),
        };

        check_scheme(&resolved.source_url)?;

        loop {
            *attempts += 1;
            let err = match self.attempt(index, &resolved, destination_dir).await {
                Ok(staged) => return Ok(staged),
                Err(err) => err,
            };

            let Some(delay) = self.options.retry.next_delay(&err, *attempts) else {
                return Err(err);
            };
            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempts,
                resolved.source_url,
                err,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One attempt: request, stage, stream, verify. Returns the verified staging file.
    async fn attempt(
        &self,
        index: usize,
        descriptor: &MediaDescriptor,
        destination_dir: &Path,
    ) -> Result<StagedFile, DownloadError> {
        let response = tokio::time::timeout(
            self.options.read_timeout,
            self.client.get(&descriptor.source_url),
        )
        .await
        .map_err(|_| DownloadError::Transient("request timed out".to_string()))?
        .map_err(|e| DownloadError::from_reqwest(&e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(if is_transient_status(status) {
                DownloadError::Transient(format!("HTTP {}", status))
            } else {
                DownloadError::status(status)
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let expected_len = response.content_length();

        let name = derive_filename(descriptor, index, content_type.as_deref());
        let mut staged = claim(destination_dir, &name).await?;

        let bar = self.progress.add(match expected_len {
            Some(len) => create_download_bar(len, &name),
            None => create_spinner(&name),
        });

        let received = stream_to(
            response,
            &mut staged,
            &bar,
            descriptor.checksum.is_some(),
            self.options.read_timeout,
        )
        .await;
        bar.finish_and_clear();
        self.progress.remove(&bar);
        let (written, digest) = received?;

        if let Some(expected) = expected_len {
            if expected != written {
                return Err(DownloadError::Transient(format!(
                    "expected {} bytes, received {}",
                    expected, written
                )));
            }
        }

        if let (Some(expected), Some(actual)) = (descriptor.checksum.as_deref(), digest) {
            if expected != actual {
                return Err(DownloadError::Permanent {
                    status: None,
                    message: format!("checksum mismatch: expected {}, got {}", expected, actual),
                });
            }
        }

        Ok(staged)
    }
}

/// Stream a response body into a staging file, returning bytes written and the MD5 if requested.
async fn stream_to(
    response: reqwest::Response,
    staged: &mut StagedFile,
    bar: &ProgressBar,
    hash: bool,
    read_timeout: Duration,
) -> Result<(u64, Option<String>), DownloadError> {
    let mut stream = response.bytes_stream();
    let mut hasher = hash.then(Md5::new);
    let mut written: u64 = 0;

    loop {
        let next = tokio::time::timeout(read_timeout, stream.next())
            .await
            .map_err(|_| DownloadError::Transient("read timed out".to_string()))?;

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| DownloadError::from_reqwest(&e))?;

        staged.write_all(&chunk).await?;
        if let Some(hasher) = hasher.as_mut() {
            hasher.update(&chunk);
        }
        written += chunk.len() as u64;
        bar.set_position(written);
    }

    Ok((written, hasher.map(|h| format!("{:x}", h.finalize()))))
}

fn check_scheme(url: &str) -> Result<(), DownloadError> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::Permanent {
        status: None,
        message: format!("invalid URL '{}': {}", url, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(DownloadError::Permanent {
            status: None,
            message: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

fn store(slots: &Mutex<Vec<Option<DownloadResult>>>, index: usize, result: DownloadResult) {
    let mut slots = match slots.lock() {
        Ok(slots) => slots,
        Err(poisoned) => poisoned.into_inner(),
    };
    slots[index] = Some(result);
}

fn log_result(result: &DownloadResult) {
    match (&result.local_path, &result.error) {
        (Some(path), _) => tracing::info!("Saved {}", path.display()),
        (None, Some(DownloadError::Cancelled)) => {
            tracing::debug!("Skipped {}", result.descriptor.source_url)
        }
        (None, Some(err)) => tracing::warn!("Failed {}: {}", result.descriptor.source_url, err),
        (None, None) => {}
    }
}
