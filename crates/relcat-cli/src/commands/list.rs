// crates/relcat-cli/src/commands/list.rs
//
// `relcat list`: print every release in the catalog.

use std::io::Write;

use relcat_core::ReleaseRecord;
use relcat_rpc::ReleaseClient;

use crate::output::{self, OutputFormat};

/// Run the list command, writing the result to `out`.
pub async fn run(
    client: &mut ReleaseClient,
    format: &OutputFormat,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut releases: Vec<ReleaseRecord> = client
        .list_releases()
        .await?
        .into_iter()
        .map(ReleaseRecord::from)
        .collect();
    tracing::debug!(count = releases.len(), "Received releases");

    output::sort_releases(&mut releases);
    match format {
        OutputFormat::Table => writeln!(out, "{}", output::format_table(&releases))?,
        OutputFormat::Json => writeln!(out, "{}", output::format_json(&releases))?,
    }

    Ok(())
}
