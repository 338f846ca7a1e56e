//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars
//! - Run summary reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{print_error, print_hint, print_info, print_success, print_warning};
pub use progress::{create_download_bar, create_item_bar, create_spinner};
pub use stats::print_run_report;
