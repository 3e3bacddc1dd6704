// crates/relcat-rpc/src/lib.rs
//
// relcat-rpc: gRPC service and client for the relcat release catalog.
//
// Provides a tonic-based server exposing GetReleaseInfo and ListReleases,
// an ordered call-admission chain run in front of every handler, and a
// matching client. Messages are prost types derived by hand, so there is
// no build-time protobuf codegen.

pub mod client;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod operation;
pub mod proto;
pub mod server;

// Re-export the main entry points for ergonomic access.
pub use client::{ClientConfig, ClientTls, ReleaseClient};
pub use error::RpcError;
pub use middleware::{AdmissionChain, AdmissionStage, CallContext, CallObserver, CredentialStage};
pub use operation::{Admission, Operation};
pub use server::{ReleaseRpcServer, RpcConfig, TlsIdentity};
