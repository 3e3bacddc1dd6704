// crates/relcat-cli/src/output.rs
//
// Output formatting for the relcat CLI.
// Supports a tab-separated table and JSON.

use clap::ValueEnum;
use relcat_core::ReleaseRecord;
use serde::Serialize;

/// Output format for CLI commands.
#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated table with a header row (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

pub const TABLE_HEADER: &str = "Version\tRelease Date\tRelease Notes";

pub const NO_RELEASES: &str = "No releases found";

/// Sort releases ascending by version string.
///
/// Plain string order, so "1.10" sorts before "1.9".
pub fn sort_releases(releases: &mut [ReleaseRecord]) {
    releases.sort_by(|a, b| a.version.cmp(&b.version));
}

/// Render releases as a header plus one row each, or `No releases found`.
pub fn format_table(releases: &[ReleaseRecord]) -> String {
    if releases.is_empty() {
        return NO_RELEASES.to_string();
    }
    let mut lines = Vec::with_capacity(releases.len() + 1);
    lines.push(TABLE_HEADER.to_string());
    lines.extend(releases.iter().map(format_row));
    lines.join("\n")
}

fn format_row(release: &ReleaseRecord) -> String {
    format!(
        "{}\t{}\t{}",
        release.version, release.release_date, release.release_notes_url
    )
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}
