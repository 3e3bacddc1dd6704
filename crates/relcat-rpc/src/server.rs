// crates/relcat-rpc/src/server.rs
//
// RPC server setup: ReleaseRpcServer, RpcConfig and TLS identity loading.
//
// The gRPC service is wired by hand rather than generated: a tower
// `Service` routes on the request path, resolves the `Operation`, and
// hands the call to tonic's unary codec machinery. Every call goes through
// the `AdmissionChain` before its handler runs.

use std::net::SocketAddr;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use http_body::Body as HttpBody;
use relcat_core::Catalog;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::codec::ProstCodec;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic::Status;

use crate::error::RpcError;
use crate::handlers;
use crate::middleware::{AdmissionChain, CallContext};
use crate::operation::{Operation, SERVICE_NAME};
use crate::proto::{
    GetReleaseInfoRequest, ListReleasesRequest, ListReleasesResponse, ReleaseInfo,
};

type BoxFuture<T, E> = Pin<Box<dyn std::future::Future<Output = Result<T, E>> + Send + 'static>>;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Server certificate chain and private key, PEM encoded.
#[derive(Clone)]
pub struct TlsIdentity {
    cert_pem: Vec<u8>,
    key_pem: Vec<u8>,
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("cert_bytes", &self.cert_pem.len())
            .finish()
    }
}

impl TlsIdentity {
    pub fn from_pem(cert_pem: impl Into<Vec<u8>>, key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
        }
    }

    /// Read a certificate and key pair from disk.
    pub fn load(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Self, RpcError> {
        let cert_pem = std::fs::read(cert_path)?;
        let key_pem = std::fs::read(key_path)?;
        Ok(Self::from_pem(cert_pem, key_pem))
    }

    fn server_tls_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new().identity(Identity::from_pem(&self.cert_pem, &self.key_pem))
    }
}

/// Configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Address to listen on. A bare ":port" listens on all interfaces.
    pub listen: String,
    /// TLS identity. `None` serves plaintext.
    pub tls: Option<TlsIdentity>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            listen: ":7100".to_string(),
            tls: None,
        }
    }
}

/// Resolve a listen address, accepting the ":port" shorthand.
pub async fn resolve_listen_addr(listen: &str) -> Result<SocketAddr, RpcError> {
    let candidate = if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    };
    let addr = tokio::net::lookup_host(candidate.as_str())
        .await
        .map_err(|_| RpcError::InvalidAddress(listen.to_string()))?
        .next();
    addr.ok_or_else(|| RpcError::InvalidAddress(listen.to_string()))
}

// ---------------------------------------------------------------------------
// ReleaseRpcServer
// ---------------------------------------------------------------------------

/// The release catalog RPC server.
///
/// Holds the shared catalog and the admission chain applied to every call.
#[derive(Debug, Clone)]
pub struct ReleaseRpcServer {
    config: RpcConfig,
    catalog: Arc<Catalog>,
    chain: AdmissionChain,
}

impl ReleaseRpcServer {
    /// Create a server over `catalog` with an empty admission chain.
    pub fn new(config: RpcConfig, catalog: Arc<Catalog>) -> Self {
        Self {
            config,
            catalog,
            chain: AdmissionChain::default(),
        }
    }

    /// Set the admission chain run in front of every handler.
    pub fn with_admission(mut self, chain: AdmissionChain) -> Self {
        self.chain = chain;
        self
    }

    fn service(&self) -> ReleaseServiceServer {
        ReleaseServiceServer {
            inner: Arc::new(ReleaseServiceImpl {
                catalog: self.catalog.clone(),
                chain: self.chain.clone(),
            }),
        }
    }

    fn builder(&self) -> Result<Server, RpcError> {
        let mut builder = Server::builder();
        if let Some(tls) = &self.config.tls {
            builder = builder.tls_config(tls.server_tls_config())?;
        }
        Ok(builder)
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn start(&self) -> Result<(), RpcError> {
        let addr = resolve_listen_addr(&self.config.listen).await?;

        tracing::info!(
            %addr,
            tls = self.config.tls.is_some(),
            admission_stages = self.chain.len(),
            releases = self.catalog.len(),
            "relcat RPC server listening"
        );

        self.builder()?
            .add_service(self.service())
            .serve_with_shutdown(addr, async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown signal received");
                }
            })
            .await?;

        Ok(())
    }

    /// Serve on an already-bound listener until the task is dropped.
    pub async fn serve_with_listener(&self, listener: TcpListener) -> Result<(), RpcError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, tls = self.config.tls.is_some(), "relcat RPC server listening");
        }

        self.builder()?
            .add_service(self.service())
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Service implementation
// ---------------------------------------------------------------------------

/// Shared state behind every call.
struct ReleaseServiceImpl {
    catalog: Arc<Catalog>,
    chain: AdmissionChain,
}

impl ReleaseServiceImpl {
    async fn get_release_info(
        &self,
        request: tonic::Request<GetReleaseInfoRequest>,
    ) -> Result<tonic::Response<ReleaseInfo>, Status> {
        let ctx = CallContext::from_request(Operation::GetReleaseInfo, &request);
        let message = request.into_inner();
        let catalog = self.catalog.as_ref();
        self.chain
            .run(ctx, || handlers::release::handle_get_release_info(catalog, message))
            .await
            .map(tonic::Response::new)
    }

    async fn list_releases(
        &self,
        request: tonic::Request<ListReleasesRequest>,
    ) -> Result<tonic::Response<ListReleasesResponse>, Status> {
        let ctx = CallContext::from_request(Operation::ListReleases, &request);
        let message = request.into_inner();
        let catalog = self.catalog.as_ref();
        self.chain
            .run(ctx, || handlers::release::handle_list_releases(catalog, message))
            .await
            .map(tonic::Response::new)
    }
}

struct GetReleaseInfoSvc(Arc<ReleaseServiceImpl>);

impl tonic::server::UnaryService<GetReleaseInfoRequest> for GetReleaseInfoSvc {
    type Response = ReleaseInfo;
    type Future = BoxFuture<tonic::Response<Self::Response>, Status>;

    fn call(&mut self, request: tonic::Request<GetReleaseInfoRequest>) -> Self::Future {
        let inner = Arc::clone(&self.0);
        Box::pin(async move { inner.get_release_info(request).await })
    }
}

struct ListReleasesSvc(Arc<ReleaseServiceImpl>);

impl tonic::server::UnaryService<ListReleasesRequest> for ListReleasesSvc {
    type Response = ListReleasesResponse;
    type Future = BoxFuture<tonic::Response<Self::Response>, Status>;

    fn call(&mut self, request: tonic::Request<ListReleasesRequest>) -> Self::Future {
        let inner = Arc::clone(&self.0);
        Box::pin(async move { inner.list_releases(request).await })
    }
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------

/// The tower service registered with tonic's router.
#[derive(Clone)]
pub struct ReleaseServiceServer {
    inner: Arc<ReleaseServiceImpl>,
}

impl std::fmt::Debug for ReleaseServiceServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseServiceServer").finish()
    }
}

impl tonic::server::NamedService for ReleaseServiceServer {
    const NAME: &'static str = SERVICE_NAME;
}

impl<B> tower_service::Service<http::Request<B>> for ReleaseServiceServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        match Operation::from_path(req.uri().path()) {
            Some(Operation::GetReleaseInfo) => Box::pin(async move {
                let mut grpc = tonic::server::Grpc::new(ProstCodec::default());
                Ok(grpc.unary(GetReleaseInfoSvc(inner), req).await)
            }),
            Some(Operation::ListReleases) => Box::pin(async move {
                let mut grpc = tonic::server::Grpc::new(ProstCodec::default());
                Ok(grpc.unary(ListReleasesSvc(inner), req).await)
            }),
            None => {
                tracing::debug!(path = req.uri().path(), "Unknown RPC method");
                Box::pin(async move { Ok(unimplemented_response()) })
            }
        }
    }
}

/// A gRPC `UNIMPLEMENTED` response with an empty body.
fn unimplemented_response() -> http::Response<tonic::body::BoxBody> {
    let mut response = http::Response::new(tonic::body::empty_body());
    let headers = response.headers_mut();
    headers.insert(
        "grpc-status",
        http::HeaderValue::from(tonic::Code::Unimplemented as i32),
    );
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/grpc"),
    );
    response
}
