// crates/relcat-rpc/src/handlers/release.rs
//
// Release query handlers: GetReleaseInfo, ListReleases.
//
// Both are read-only over a shared `Catalog` and safe to run concurrently
// without coordination.

use relcat_core::Catalog;
use tonic::Status;

use crate::proto::{GetReleaseInfoRequest, ListReleasesRequest, ListReleasesResponse, ReleaseInfo};

// ---------------------------------------------------------------------------
// GetReleaseInfo
// ---------------------------------------------------------------------------

/// Handle a GetReleaseInfo request.
///
/// The response `version` is the one the caller asked for, which is also
/// the catalog key it was found under.
pub async fn handle_get_release_info(
    catalog: &Catalog,
    request: GetReleaseInfoRequest,
) -> Result<ReleaseInfo, Status> {
    match catalog.get(&request.version) {
        Some(record) => Ok(ReleaseInfo {
            version: request.version,
            release_date: record.release_date.clone(),
            release_notes_url: record.release_notes_url.clone(),
        }),
        None => Err(Status::not_found(format!(
            "release version {} not found",
            request.version
        ))),
    }
}

// ---------------------------------------------------------------------------
// ListReleases
// ---------------------------------------------------------------------------

/// Handle a ListReleases request.
///
/// Never fails. No sorting, filtering or paging is done server side.
pub async fn handle_list_releases(
    catalog: &Catalog,
    _request: ListReleasesRequest,
) -> Result<ListReleasesResponse, Status> {
    let releases = catalog.all().into_iter().map(ReleaseInfo::from).collect();
    Ok(ListReleasesResponse { releases })
}
