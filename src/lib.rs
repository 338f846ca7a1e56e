//! Postgrab - download the media embedded in a social media post
//!
//! This library fetches a post page, picks the extraction strategy registered for
//! its URL, lists the media the page embeds and downloads them concurrently.
//!
//! # Features
//!
//! - Ordered, pattern-keyed extractor registry (imgur, OpenGraph pages)
//! - Bounded worker pool with per-item retry and exponential backoff
//! - Staged writes: files appear under their final name only when complete
//! - Collision-safe naming that never overwrites existing files
//! - Cancellation that keeps finished files and cleans up partial ones
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use postgrab::{Config, DownloadOptions, ExtractorRegistry, HttpClient, RunCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let registry = ExtractorRegistry::with_builtin(&config.extractors);
//!     let client = HttpClient::new(&config)?;
//!
//!     let mut coordinator =
//!         RunCoordinator::new(&registry, client, DownloadOptions::from_config(&config));
//!     let report = coordinator
//!         .run("https://imgur.com/a/abc123", Path::new("downloads"))
//!         .await?;
//!     println!("{} of {} saved", report.succeeded, report.total);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod fs;
pub mod media;
pub mod output;
pub mod pipeline;

// Re-exports for convenience
pub use config::Config;
pub use download::{DownloadEngine, DownloadOptions, DownloadOutcome, DownloadResult, RunReport};
pub use error::{DownloadError, Error, FetchError, Result};
pub use extractors::{Extractor, ExtractorRegistry, UrlPattern};
pub use fetch::{HttpClient, ResolvedDocument};
pub use media::{MediaDescriptor, MediaKind};
pub use pipeline::{RunCoordinator, RunState};
