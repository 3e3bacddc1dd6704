// crates/relcat-core/src/error.rs

use thiserror::Error;

/// Error type for catalog loading and record validation.
///
/// Per-call RPC failures are expressed as `tonic::Status` in relcat-rpc;
/// this type only covers what can go wrong before the server accepts calls.
#[derive(Debug, Error)]
pub enum RelcatError {
    /// The catalog source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog source was read but is not valid release JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A record violates a catalog invariant (e.g. empty version key).
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl From<serde_json::Error> for RelcatError {
    fn from(e: serde_json::Error) -> Self {
        RelcatError::Parse(e.to_string())
    }
}
