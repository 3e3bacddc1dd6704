// crates/relcat-server/src/main.rs
//
// Binary entrypoint for the relcat release catalog server.
//
// Parses CLI arguments, loads configuration, initializes tracing, loads the
// release catalog and TLS identity, builds the admission chain, and serves
// until Ctrl-C.

mod config;

use std::sync::Arc;

use clap::Parser;
use config::{expand_tilde, ServerConfig};

use relcat_core::Catalog;
use relcat_rpc::ReleaseRpcServer;

/// relcat server: answers release catalog queries over gRPC.
#[derive(Parser, Debug)]
#[command(name = "relcat-server", version = "0.1.0", about = "Release catalog RPC server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "relcat.toml")]
    config: String,

    /// Listen address, e.g. ":7100" or "127.0.0.1:7100".
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Path to the JSON release data file.
    #[arg(long)]
    data: Option<String>,

    /// TLS certificate (PEM).
    #[arg(long)]
    cert: Option<String>,

    /// TLS private key (PEM).
    #[arg(long)]
    key: Option<String>,

    /// Serve without TLS.
    #[arg(long)]
    plaintext: bool,

    /// Admit every call without checking credentials.
    #[arg(long)]
    no_auth: bool,
}

impl Args {
    /// CLI flags override values from the config file.
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(listen) = &self.listen {
            config.listen = listen.clone();
        }
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(cert) = &self.cert {
            config.tls.cert_path = cert.clone();
        }
        if let Some(key) = &self.key {
            config.tls.key_path = key.clone();
        }
        if self.plaintext {
            config.tls.enabled = false;
        }
        if self.no_auth {
            config.auth.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The config file supplies the fallback log level, so it is read before
    // the subscriber exists and the outcome is logged afterwards.
    let loaded = ServerConfig::load_if_present(&args.config);
    let mut server_config = match &loaded {
        Ok(Some(cfg)) => cfg.clone(),
        _ => ServerConfig::default(),
    };
    args.apply(&mut server_config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&server_config.log_level)),
        )
        .init();

    match loaded {
        Ok(Some(_)) => tracing::info!("Loaded configuration from {}", args.config),
        Ok(None) => tracing::warn!("No config file at {}. Using defaults.", args.config),
        Err(e) => {
            tracing::error!("Invalid config file {}: {}", args.config, e);
            return Err(e);
        }
    }

    tracing::info!("relcat server v0.1.0");
    tracing::info!("Data file: {}", server_config.data_path);
    tracing::info!("TLS: {}", if server_config.tls.enabled { "enabled" } else { "disabled" });
    tracing::info!(
        "Auth: {}",
        if server_config.auth.enabled { "enabled" } else { "disabled" }
    );

    let data_path = expand_tilde(&server_config.data_path);
    let catalog = match Catalog::load(&data_path) {
        Ok(catalog) => {
            tracing::info!("Loaded {} releases from {}", catalog.len(), data_path);
            catalog
        }
        Err(e) => {
            tracing::error!("Failed to load release data from {}: {}", data_path, e);
            return Err(e.into());
        }
    };

    let rpc_config = match server_config.rpc_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(
                "Failed to load TLS identity ({}, {}): {}",
                server_config.tls.cert_path,
                server_config.tls.key_path,
                e
            );
            return Err(e.into());
        }
    };

    if !server_config.tls.enabled && server_config.auth.enabled {
        tracing::warn!("Credentials will be accepted over a plaintext channel");
    }

    let server = ReleaseRpcServer::new(rpc_config, Arc::new(catalog))
        .with_admission(server_config.admission_chain());

    if let Err(e) = server.start().await {
        tracing::error!("RPC server error: {}", e);
        return Err(e.into());
    }

    tracing::info!("relcat server stopped");
    Ok(())
}
