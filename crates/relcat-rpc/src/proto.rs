// crates/relcat-rpc/src/proto.rs
//
// Wire messages for relcat.v1.ReleaseService.
//
// Equivalent protobuf definition:
//
//   message GetReleaseInfoRequest { string version = 1; }
//   message ReleaseInfo {
//     string version = 1;
//     string release_date = 2;
//     string release_notes_url = 3;
//   }
//   message ListReleasesRequest {}
//   message ListReleasesResponse { repeated ReleaseInfo releases = 1; }

use relcat_core::ReleaseRecord;

/// Request for a single release by version.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetReleaseInfoRequest {
    #[prost(string, tag = "1")]
    pub version: ::prost::alloc::string::String,
}

/// A single release as sent over the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReleaseInfo {
    #[prost(string, tag = "1")]
    pub version: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub release_date: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub release_notes_url: ::prost::alloc::string::String,
}

/// Request to list every release. Carries no fields.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListReleasesRequest {}

/// Every release in the catalog, in no particular order.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListReleasesResponse {
    #[prost(message, repeated, tag = "1")]
    pub releases: ::prost::alloc::vec::Vec<ReleaseInfo>,
}

impl From<ReleaseRecord> for ReleaseInfo {
    fn from(record: ReleaseRecord) -> Self {
        Self {
            version: record.version,
            release_date: record.release_date,
            release_notes_url: record.release_notes_url,
        }
    }
}

impl From<ReleaseInfo> for ReleaseRecord {
    fn from(info: ReleaseInfo) -> Self {
        ReleaseRecord {
            version: info.version,
            release_date: info.release_date,
            release_notes_url: info.release_notes_url,
        }
    }
}
