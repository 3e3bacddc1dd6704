// crates/relcat-rpc/src/client.rs
//
// Client for relcat.v1.ReleaseService.
//
// Wraps a tonic channel and attaches the caller's basic-auth credential to
// every request as `authorization` metadata. Each call is a single attempt;
// there is no retry logic.

use std::path::Path;

use http::uri::PathAndQuery;
use relcat_core::BasicCredential;
use tonic::codec::ProstCodec;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tonic::Status;

use crate::error::RpcError;
use crate::middleware::AUTHORIZATION_KEY;
use crate::operation::Operation;
use crate::proto::{GetReleaseInfoRequest, ListReleasesRequest, ListReleasesResponse, ReleaseInfo};

/// Trust settings for a TLS connection.
#[derive(Clone)]
pub struct ClientTls {
    /// PEM-encoded CA (or self-signed server) certificate to trust.
    pub ca_pem: Vec<u8>,
    /// Name the server certificate must be valid for.
    pub domain: String,
}

impl std::fmt::Debug for ClientTls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTls")
            .field("domain", &self.domain)
            .finish()
    }
}

impl ClientTls {
    /// Read the trusted certificate from disk.
    pub fn load(ca_path: impl AsRef<Path>, domain: impl Into<String>) -> Result<Self, RpcError> {
        Ok(Self {
            ca_pem: std::fs::read(ca_path)?,
            domain: domain.into(),
        })
    }
}

/// How to reach the server and who to call as.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// "host:port", a bare ":port" (meaning localhost), or a full URI.
    pub target: String,
    /// TLS settings. `None` connects in plaintext.
    pub tls: Option<ClientTls>,
    /// Credential sent with every call.
    pub credential: Option<BasicCredential>,
}

impl ClientConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            tls: None,
            credential: None,
        }
    }

    pub fn with_tls(mut self, tls: ClientTls) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_credential(mut self, credential: BasicCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// The URI to dial, with scheme chosen by whether TLS is configured.
    pub fn endpoint_uri(&self) -> String {
        if self.target.contains("://") {
            return self.target.clone();
        }
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        if self.target.starts_with(':') {
            format!("{}://localhost{}", scheme, self.target)
        } else {
            format!("{}://{}", scheme, self.target)
        }
    }
}

/// Client for the release catalog service.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    inner: tonic::client::Grpc<Channel>,
    credential: Option<BasicCredential>,
}

impl ReleaseClient {
    /// Dial the server described by `config`.
    ///
    /// Refuses to send credentials over a plaintext channel: the token is
    /// only an encoding of the password.
    pub async fn connect(config: ClientConfig) -> Result<Self, RpcError> {
        if config.tls.is_none() && config.credential.is_some() {
            return Err(RpcError::CredentialsRequireTls);
        }

        let mut endpoint = Endpoint::from_shared(config.endpoint_uri())?;
        if let Some(tls) = &config.tls {
            endpoint = endpoint.tls_config(
                ClientTlsConfig::new()
                    .ca_certificate(Certificate::from_pem(&tls.ca_pem))
                    .domain_name(tls.domain.clone()),
            )?;
        }

        tracing::debug!(target_uri = %config.endpoint_uri(), "Connecting to relcat server");
        let channel = endpoint.connect().await?;
        Ok(Self::new(channel, config.credential))
    }

    /// Wrap an existing channel. No transport-security check is made here.
    pub fn new(channel: Channel, credential: Option<BasicCredential>) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
            credential,
        }
    }

    /// Fetch one release by version. Fails with `NotFound` for unknown
    /// versions.
    pub async fn get_release_info(
        &mut self,
        version: impl Into<String>,
    ) -> Result<ReleaseInfo, Status> {
        let request = self.request(GetReleaseInfoRequest {
            version: version.into(),
        })?;
        self.unary(Operation::GetReleaseInfo, request).await
    }

    /// Fetch every release, in the order the server sent them.
    pub async fn list_releases(&mut self) -> Result<Vec<ReleaseInfo>, Status> {
        let request = self.request(ListReleasesRequest {})?;
        let response: ListReleasesResponse =
            self.unary(Operation::ListReleases, request).await?;
        Ok(response.releases)
    }

    /// Wrap a message, attaching the credential if one is configured.
    fn request<M>(&self, message: M) -> Result<tonic::Request<M>, Status> {
        let mut request = tonic::Request::new(message);
        if let Some(credential) = &self.credential {
            let value = MetadataValue::<Ascii>::try_from(credential.authorization_value())
                .map_err(|_| Status::invalid_argument("credential is not valid metadata"))?;
            request.metadata_mut().insert(AUTHORIZATION_KEY, value);
        }
        Ok(request)
    }

    async fn unary<Req, Resp>(
        &mut self,
        operation: Operation,
        request: tonic::Request<Req>,
    ) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {}", e)))?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let path = PathAndQuery::from_static(operation.path());
        let response = self.inner.unary(request, path, codec).await?;
        Ok(response.into_inner())
    }
}
