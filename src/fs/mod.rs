//! Filesystem module.
//!
//! Provides:
//! - Filename derivation and sanitizing
//! - Race-free name claiming with staged, atomic publication

pub mod naming;
pub mod staging;

pub use naming::{candidate_name, derive_filename, is_staging_file, sanitize_filename};
pub use staging::{claim, StagedFile};
