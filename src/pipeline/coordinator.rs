//! Drives one post URL through fetch, extractor selection, extraction and download.

use std::fmt;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::download::{DownloadEngine, DownloadOptions, RunReport};
use crate::error::{Error, Result};
use crate::extractors::ExtractorRegistry;
use crate::fetch::{fetch_document, HttpClient};

/// Stage of a run.
///
/// `Failed` is only reachable before `Downloading`; once downloads start the run
/// always ends in `Done` with a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Selecting,
    Extracting,
    Downloading,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Selecting => "selecting",
            RunState::Extracting => "extracting",
            RunState::Downloading => "downloading",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs the pipeline for a single post.
pub struct RunCoordinator<'a> {
    registry: &'a ExtractorRegistry,
    client: HttpClient,
    options: DownloadOptions,
    cancel: CancellationToken,
    state: RunState,
}

impl<'a> RunCoordinator<'a> {
    pub fn new(registry: &'a ExtractorRegistry, client: HttpClient, options: DownloadOptions) -> Self {
        Self {
            registry,
            client,
            options,
            cancel: CancellationToken::new(),
            state: RunState::Idle,
        }
    }

    /// Stop the run when `token` is cancelled.
    ///
    /// Before downloads start this fails the run with [`Error::Cancelled`]; during
    /// downloads unfinished items are reported as skipped.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Download every media item of the post at `post_url` into `destination_dir`.
    pub async fn run(&mut self, post_url: &str, destination_dir: &Path) -> Result<RunReport> {
        match self.drive(post_url, destination_dir).await {
            Ok(report) => {
                self.transition(RunState::Done);
                Ok(report)
            }
            Err(e) => {
                tracing::debug!("Run failed while {}: {}", self.state, e);
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn drive(&mut self, post_url: &str, destination_dir: &Path) -> Result<RunReport> {
        self.transition(RunState::Fetching);
        let document = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            document = fetch_document(&self.client, post_url) => document?,
        };

        self.transition(RunState::Selecting);
        tracing::info!("attempting to determine which extractor to use");
        let extractor = self.registry.select(document.final_url())?;
        tracing::info!("using {}", extractor.name());

        self.transition(RunState::Extracting);
        let descriptors = extractor.extract(&document)?;
        tracing::info!("Found {} media items", descriptors.len());

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.transition(RunState::Downloading);
        let engine = DownloadEngine::new(self.client.clone(), self.options.clone())
            .with_cancellation(self.cancel.clone())
            .with_resolver(extractor);

        Ok(engine.download_all(descriptors, destination_dir).await)
    }

    fn transition(&mut self, next: RunState) {
        tracing::trace!("{} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::extractors::{OpenGraphExtractor, UrlPattern};
    use crate::error::FetchError;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn local_registry() -> ExtractorRegistry {
        let mut registry = ExtractorRegistry::new();
        registry.register(UrlPattern::host("127.0.0.1"), Arc::new(OpenGraphExtractor));
        registry
    }

    fn client() -> HttpClient {
        HttpClient::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RunState::Downloading.to_string(), "downloading");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let registry = local_registry();
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = RunCoordinator::new(&registry, client(), DownloadOptions::default());
        assert_eq!(coordinator.state(), RunState::Idle);

        let err = coordinator
            .run(&format!("{}/post/1", server.uri()), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Fetch(FetchError::HttpStatus { status: 404, .. })
        ));
        assert_eq!(coordinator.state(), RunState::Failed);
    }

    #[tokio::test]
    async fn test_unsupported_url_fails_at_selection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let registry = ExtractorRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/x", server.uri());
        let mut coordinator = RunCoordinator::new(&registry, client(), DownloadOptions::default());

        let err = coordinator.run(&url, dir.path()).await.unwrap_err();
        match err {
            Error::UrlNotSupported { url: rejected } => assert_eq!(rejected, url),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(coordinator.state(), RunState::Failed);
    }

    #[tokio::test]
    async fn test_post_without_media_is_done() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post/1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><head></head></html>"),
            )
            .mount(&server)
            .await;

        let registry = local_registry();
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = RunCoordinator::new(&registry, client(), DownloadOptions::default());

        let report = coordinator
            .run(&format!("{}/post/1", server.uri()), dir.path())
            .await
            .unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(coordinator.state(), RunState::Done);
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch() {
        let registry = local_registry();
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let mut coordinator = RunCoordinator::new(&registry, client(), DownloadOptions::default())
            .with_cancellation(token);
        let err = coordinator
            .run("http://127.0.0.1:9/post", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(coordinator.state(), RunState::Failed);
    }
}
