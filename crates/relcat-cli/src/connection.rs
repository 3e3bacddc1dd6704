// crates/relcat-cli/src/connection.rs
//
// Connection flags shared by every subcommand, and dialing the server.

use clap::Args;
use relcat_core::credential::{DEMO_PASSWORD, DEMO_USERNAME};
use relcat_core::BasicCredential;
use relcat_rpc::{ClientConfig, ClientTls, ReleaseClient};

/// How to reach the server and who to call as.
#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Server address. ":7100" means localhost:7100.
    #[arg(short = 'l', long, global = true, default_value = ":7100")]
    pub target: String,

    /// Username sent with every call.
    #[arg(short = 'u', long, global = true, default_value = DEMO_USERNAME)]
    pub username: String,

    /// Password sent with every call.
    #[arg(short = 'p', long, global = true, default_value = DEMO_PASSWORD)]
    pub password: String,

    /// CA certificate used to verify the server (PEM).
    #[arg(long, global = true, default_value = "certs/ca.crt")]
    pub ca_cert: String,

    /// Name the server certificate must be valid for.
    #[arg(long, global = true, default_value = "localhost")]
    pub domain: String,

    /// Connect without TLS. Credentials are not sent.
    #[arg(long, global = true)]
    pub plaintext: bool,
}

impl ConnectArgs {
    /// Translate the flags into a client configuration, reading the CA
    /// certificate unless `--plaintext` is set.
    pub fn client_config(&self) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        let config = ClientConfig::new(self.target.clone());
        if self.plaintext {
            tracing::warn!("Plaintext connection: credentials will not be sent");
            return Ok(config);
        }

        let tls = ClientTls::load(&self.ca_cert, self.domain.clone()).map_err(|e| {
            format!("could not read CA certificate {}: {}", self.ca_cert, e)
        })?;
        Ok(config
            .with_tls(tls)
            .with_credential(BasicCredential::new(self.username.clone(), self.password.clone())))
    }
}

/// Dial the server described by the flags. One attempt, no retries.
pub async fn connect(args: &ConnectArgs) -> Result<ReleaseClient, Box<dyn std::error::Error>> {
    let config = args.client_config()?;
    let client = ReleaseClient::connect(config).await?;
    Ok(client)
}
