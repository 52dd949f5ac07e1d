//! Run summary rendering

use crate::engine::RunSummary;

/// Formats a completed run as a small plain-text report
pub fn format_summary(title: &str, summary: &RunSummary) -> String {
    let stats = &summary.stats;
    format!(
        "\n{} Summary:\n  Total items: {}\n  Downloaded: {}\n  Already present: {}\n  Not found: {}\n  Failed: {}\n{}\n",
        title,
        stats.total_items,
        stats.success,
        stats.skipped,
        stats.not_found,
        stats.error,
        summary.message
    )
}

/// Prints a completed run to stdout
pub fn print_summary(title: &str, summary: &RunSummary) {
    print!("{}", format_summary(title, summary));
}
