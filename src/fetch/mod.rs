//! Page fetching module.
//!
//! This module provides:
//! - The shared HTTP client
//! - Post page retrieval with redirect resolution

pub mod client;
pub mod document;

pub use client::HttpClient;
pub use document::{fetch_document, ResolvedDocument};
