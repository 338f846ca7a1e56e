//! Site-specific extraction strategies.
//!
//! This module provides:
//! - The [`Extractor`] contract every strategy implements
//! - The ordered [`ExtractorRegistry`] that picks one strategy per URL
//! - Built-in strategies for imgur and OpenGraph-tagged pages

pub mod imgur;
pub mod opengraph;
pub mod registry;

use async_trait::async_trait;

use crate::error::{DownloadError, Result};
use crate::fetch::{HttpClient, ResolvedDocument};
use crate::media::MediaDescriptor;

pub use imgur::ImgurExtractor;
pub use opengraph::OpenGraphExtractor;
pub use registry::{ExtractorRegistry, UrlPattern};

/// Turns a fetched post page into the media it embeds.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// List the page's media in page order.
    ///
    /// Must not touch the network. A well-formed page without media yields an empty
    /// list; a page whose structure the strategy does not recognize is an
    /// [`crate::Error::Extraction`].
    fn extract(&self, document: &ResolvedDocument) -> Result<Vec<MediaDescriptor>>;

    /// Turn a descriptor into a directly downloadable one.
    ///
    /// Strategies whose media URLs need one more request (CDN redirects, API lookups)
    /// override this. Failures are reported per asset as [`DownloadError::Unresolved`].
    async fn resolve(
        &self,
        _client: &HttpClient,
        descriptor: MediaDescriptor,
    ) -> std::result::Result<MediaDescriptor, DownloadError> {
        Ok(descriptor)
    }
}
