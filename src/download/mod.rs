//! Download module for media retrieval.
//!
//! This module provides:
//! - The concurrent download engine
//! - Retry policy with exponential backoff
//! - Per-item results and the run report

pub mod engine;
pub mod report;
pub mod retry;

pub use engine::{DownloadEngine, DownloadOptions};
pub use report::{DownloadOutcome, DownloadResult, RunReport};
pub use retry::RetryPolicy;
