// crates/relcat-core/src/release.rs
//
// ReleaseRecord: one entry in the release catalog.

use serde::{Deserialize, Serialize};

/// Metadata about a single release, keyed by its version string.
///
/// `release_date` and `release_notes_url` are opaque strings; nothing in
/// relcat parses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Version identifier, e.g. "1.9.2". Unique within a catalog.
    pub version: String,
    /// Release date as supplied by the data source.
    pub release_date: String,
    /// Link to the release notes.
    pub release_notes_url: String,
}

impl ReleaseRecord {
    /// Create a new record.
    pub fn new(
        version: impl Into<String>,
        release_date: impl Into<String>,
        release_notes_url: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            release_date: release_date.into(),
            release_notes_url: release_notes_url.into(),
        }
    }
}

/// The value half of an on-disk catalog entry.
///
/// The data file is a JSON object keyed by version, so the version itself
/// is not repeated inside each entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ReleaseEntry {
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub release_notes_url: String,
}

impl ReleaseEntry {
    pub(crate) fn into_record(self, version: String) -> ReleaseRecord {
        ReleaseRecord {
            version,
            release_date: self.release_date,
            release_notes_url: self.release_notes_url,
        }
    }
}
