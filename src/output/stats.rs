//! Run summary reporting.

use console::style;

use crate::download::{DownloadOutcome, RunReport};
use crate::output::console::{print_info, print_success, print_warning};

/// Print the outcome of a run.
///
/// Failed and skipped items are always listed with their cause. Saved paths are
/// listed only when `verbose` is set.
pub fn print_run_report(report: &RunReport, verbose: bool) {
    if report.total == 0 {
        print_info("No media found in post");
        return;
    }

    if verbose {
        for path in report.results.iter().filter_map(|r| r.local_path.as_ref()) {
            print_success(&format!("Saved {}", path.display()));
        }
    }

    for result in report.failures() {
        let cause = result
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let label = match result.outcome {
            DownloadOutcome::Skipped => "Skipped",
            _ => "Failed",
        };
        print_warning(&format!(
            "{} {}: {}",
            label, result.descriptor.source_url, cause
        ));
    }

    if report.is_complete_success() {
        print_success(&format!("All {} items downloaded", report.total));
    }

    println!();
    println!("{}", style("Summary:").bold());
    println!("  Total:     {}", report.total);
    println!("  Succeeded: {}", style(report.succeeded).green());
    if report.failed > 0 {
        println!("  Failed:    {}", style(report.failed).red());
    } else {
        println!("  Failed:    {}", report.failed);
    }
    if report.skipped > 0 {
        println!("  Skipped:   {}", style(report.skipped).yellow());
    }
}
