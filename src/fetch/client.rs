//! Shared HTTP client.

use std::time::Duration;

use reqwest::{redirect, Client, Response};
use url::Url;

use crate::config::Config;
use crate::error::{Error, FetchError, Result};
use crate::fetch::document::ResolvedDocument;

/// HTTP client shared by the page fetcher, extractors and the download engine.
///
/// Cloning is cheap; all clones share one connection pool and cookie store.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    fetch_timeout: Duration,
}

impl HttpClient {
    /// Build a client from the `[http]` configuration section.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .connect_timeout(config.connect_timeout())
            .redirect(redirect::Policy::limited(config.http.max_redirects))
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            fetch_timeout: config.fetch_timeout(),
        })
    }

    /// Fetch a post page, following redirects.
    ///
    /// The returned document carries the post-redirect URL. No retry happens here;
    /// every failure is reported as a [`FetchError`].
    pub async fn fetch_document(&self, url: &Url) -> std::result::Result<ResolvedDocument, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        if final_url != *url {
            tracing::debug!("Redirected to {}", final_url);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(final_url.as_str(), e))?;

        Ok(ResolvedDocument::new(final_url, body))
    }

    /// Start a GET request for a media asset.
    ///
    /// Status codes are not checked; callers classify them.
    pub async fn get(&self, url: &str) -> reqwest::Result<Response> {
        self.client.get(url).send().await
    }
}
