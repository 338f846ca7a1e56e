//! Run pipeline.
//!
//! Sequences one run: fetch the post page, select an extractor, extract media
//! descriptors and hand them to the download engine.

pub mod coordinator;

pub use coordinator::{RunCoordinator, RunState};
