// crates/relcat-core/src/catalog.rs
//
// Catalog: the immutable, process-lifetime mapping from version to
// ReleaseRecord. Built once at startup, then shared read-only.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::RelcatError;
use crate::release::{ReleaseEntry, ReleaseRecord};

/// In-memory release catalog keyed by version.
///
/// There are no mutating methods: once constructed, a `Catalog` can be
/// wrapped in an `Arc` and read from any number of tasks without locking.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    releases: HashMap<String, ReleaseRecord>,
}

impl Catalog {
    /// Load a catalog from a JSON data file.
    ///
    /// The file holds a single object keyed by version:
    ///
    /// ```json
    /// { "1.0": { "release_date": "2020-01-01", "release_notes_url": "http://x/1.0" } }
    /// ```
    ///
    /// Fails if the file is unreadable or malformed. There is no
    /// partial-success mode.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RelcatError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            releases = catalog.len(),
            "Loaded release catalog"
        );
        Ok(catalog)
    }

    /// Parse a catalog from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, RelcatError> {
        let entries: HashMap<String, ReleaseEntry> = serde_json::from_str(json)?;
        Self::from_records(
            entries
                .into_iter()
                .map(|(version, entry)| entry.into_record(version)),
        )
    }

    /// Build a catalog from already-constructed records.
    ///
    /// Rejects empty versions and duplicate versions.
    pub fn from_records<I>(records: I) -> Result<Self, RelcatError>
    where
        I: IntoIterator<Item = ReleaseRecord>,
    {
        let mut releases = HashMap::new();
        for record in records {
            if record.version.is_empty() {
                return Err(RelcatError::InvalidRecord(
                    "release version must not be empty".to_string(),
                ));
            }
            if releases.contains_key(&record.version) {
                return Err(RelcatError::InvalidRecord(format!(
                    "duplicate release version {}",
                    record.version
                )));
            }
            releases.insert(record.version.clone(), record);
        }
        Ok(Self { releases })
    }

    /// Look up a release by version. Returns `None` for unknown versions.
    pub fn get(&self, version: &str) -> Option<&ReleaseRecord> {
        self.releases.get(version)
    }

    /// Copy out every record. The order is unspecified.
    pub fn all(&self) -> Vec<ReleaseRecord> {
        self.releases.values().cloned().collect()
    }

    /// Number of releases in the catalog.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Whether the catalog holds no releases.
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}
