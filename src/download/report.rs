//! Per-asset results and the aggregated run report.

use std::fmt;
use std::path::PathBuf;

use crate::error::DownloadError;
use crate::media::MediaDescriptor;

/// What happened to one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Success => write!(f, "success"),
            DownloadOutcome::Failed => write!(f, "failed"),
            DownloadOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result for a single descriptor.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub descriptor: MediaDescriptor,
    pub outcome: DownloadOutcome,
    pub local_path: Option<PathBuf>,
    pub error: Option<DownloadError>,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

impl DownloadResult {
    pub fn success(descriptor: MediaDescriptor, path: PathBuf, attempts: u32) -> Self {
        Self {
            descriptor,
            outcome: DownloadOutcome::Success,
            local_path: Some(path),
            error: None,
            attempts,
        }
    }

    pub fn failed(descriptor: MediaDescriptor, error: DownloadError, attempts: u32) -> Self {
        Self {
            descriptor,
            outcome: DownloadOutcome::Failed,
            local_path: None,
            error: Some(error),
            attempts,
        }
    }

    /// Not attempted, or abandoned, because the run was cancelled.
    pub fn cancelled(descriptor: MediaDescriptor, attempts: u32) -> Self {
        Self {
            descriptor,
            outcome: DownloadOutcome::Skipped,
            local_path: None,
            error: Some(DownloadError::Cancelled),
            attempts,
        }
    }
}

/// Outcome of one run, in descriptor (page) order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<DownloadResult>,
}

impl RunReport {
    pub fn from_results(results: Vec<DownloadResult>) -> Self {
        let count = |outcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            total: results.len(),
            succeeded: count(DownloadOutcome::Success),
            failed: count(DownloadOutcome::Failed),
            skipped: count(DownloadOutcome::Skipped),
            results,
        }
    }

    /// Results that did not succeed.
    pub fn failures(&self) -> impl Iterator<Item = &DownloadResult> {
        self.results
            .iter()
            .filter(|r| r.outcome != DownloadOutcome::Success)
    }

    pub fn is_complete_success(&self) -> bool {
        self.succeeded == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let d = |u: &str| MediaDescriptor::new(u);
        let report = RunReport::from_results(vec![
            DownloadResult::success(d("https://x/a.jpg"), PathBuf::from("a.jpg"), 1),
            DownloadResult::failed(d("https://x/b.jpg"), DownloadError::status(403), 1),
            DownloadResult::cancelled(d("https://x/c.jpg"), 0),
            DownloadResult::success(d("https://x/d.jpg"), PathBuf::from("d.jpg"), 2),
        ]);

        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures().count(), 2);
        assert!(!report.is_complete_success());
        assert_eq!(report.results[3].descriptor.source_url, "https://x/d.jpg");
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = RunReport::from_results(Vec::new());
        assert_eq!(report.total, 0);
        assert!(report.is_complete_success());
    }
}
