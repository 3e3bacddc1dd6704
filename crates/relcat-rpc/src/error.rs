// crates/relcat-rpc/src/error.rs

use thiserror::Error;

/// Errors raised while setting up or tearing down RPC transport.
///
/// Per-call failures are `tonic::Status`, not `RpcError`.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Reading certificate or key material failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// tonic transport error (bind, TLS config, connect).
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The listen or target address could not be parsed.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// Per-call credentials were configured on a plaintext channel.
    #[error("Credentials require transport security; enable TLS or drop the credentials")]
    CredentialsRequireTls,
}
