// crates/relcat-core/src/lib.rs
//
// relcat-core: Core types for the relcat release catalog service.
//
// This is the leaf crate that the RPC layer and both binaries depend on.
// It defines release records, the immutable in-memory catalog they are
// served from, the basic-auth credential encoding, and the error type.

pub mod catalog;
pub mod credential;
pub mod error;
pub mod release;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use relcat_core::Catalog;`
pub use catalog::Catalog;
pub use credential::{BasicCredential, CredentialStore, TokenStatus};
pub use error::RelcatError;
pub use release::ReleaseRecord;
