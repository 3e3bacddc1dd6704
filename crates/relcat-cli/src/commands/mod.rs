// crates/relcat-cli/src/commands/mod.rs
//
// Command module declarations for the relcat CLI.

pub mod get;
pub mod list;

#[cfg(test)]
pub(crate) mod test_server {
    use std::sync::Arc;

    use relcat_core::Catalog;
    use relcat_rpc::{ClientConfig, ReleaseClient, ReleaseRpcServer, RpcConfig};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Catalog with releases 2.0 and 1.0, stored out of order.
    pub fn two_release_catalog() -> Catalog {
        Catalog::from_json_str(
            r#"{
                "2.0": { "release_date": "2020-06-01", "release_notes_url": "http://x/2.0" },
                "1.0": { "release_date": "2020-01-01", "release_notes_url": "http://x/1.0" }
            }"#,
        )
        .unwrap()
    }

    /// Serve `catalog` in plaintext on a loopback port and connect to it.
    pub async fn serve(catalog: Catalog) -> (ReleaseClient, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = RpcConfig {
            listen: addr.to_string(),
            tls: None,
        };
        let server = ReleaseRpcServer::new(config, Arc::new(catalog));
        let handle = tokio::spawn(async move {
            server.serve_with_listener(listener).await.unwrap();
        });

        let client = ReleaseClient::connect(ClientConfig::new(addr.to_string()))
            .await
            .unwrap();
        (client, handle)
    }
}
