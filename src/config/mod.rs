//! Configuration module for postgrab.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation
//! - Post URL normalization

pub mod loader;
pub mod validation;

pub use loader::{default_config_path, Config, DownloadConfig, ExtractorsConfig, HttpConfig};
pub use validation::{normalize_post_url, parse_post_url, validate_config};
