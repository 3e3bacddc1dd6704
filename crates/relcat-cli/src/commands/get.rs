// crates/relcat-cli/src/commands/get.rs
//
// `relcat get <version>`: print one release.

use std::io::Write;

use relcat_core::ReleaseRecord;
use relcat_rpc::ReleaseClient;

use crate::output::{self, OutputFormat};

/// Run the get command, writing the result to `out`. An unknown version
/// surfaces as the server's `NotFound` status and nothing is written.
pub async fn run(
    client: &mut ReleaseClient,
    version: &str,
    format: &OutputFormat,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let release = ReleaseRecord::from(client.get_release_info(version).await?);

    match format {
        OutputFormat::Table => writeln!(
            out,
            "{}",
            output::format_table(std::slice::from_ref(&release))
        )?,
        OutputFormat::Json => writeln!(out, "{}", output::format_json(&release))?,
    }

    Ok(())
}
