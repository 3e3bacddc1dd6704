// crates/relcat-server/src/config.rs
//
// Runtime configuration for the relcat server.
// Loaded from a TOML file or populated with defaults, then overridden by
// command-line flags in main.rs.

use std::fs;
use std::sync::Arc;

use relcat_core::{BasicCredential, CredentialStore};
use relcat_rpc::middleware::{AdmissionChain, CredentialStage};
use relcat_rpc::server::{RpcConfig, TlsIdentity};
use relcat_rpc::{Admission, Operation, RpcError};
use serde::Deserialize;

/// Runtime configuration for the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address. ":7100" listens on every interface.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path to the JSON release data file.
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Log level used when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Transport security settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cert_path")]
    pub cert_path: String,

    #[serde(default = "default_key_path")]
    pub key_path: String,
}

/// Per-call credential settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Operations admitted without credentials.
    #[serde(default = "default_exempt")]
    pub exempt: Vec<Operation>,

    /// Known credentials. Entries with `valid = false` are known but
    /// rejected as revoked.
    #[serde(default = "default_credentials")]
    pub credentials: Vec<CredentialEntry>,
}

/// One allow-list entry.
#[derive(Clone, Deserialize)]
pub struct CredentialEntry {
    pub username: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub valid: bool,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("username", &self.username)
            .field("valid", &self.valid)
            .finish()
    }
}

fn default_listen() -> String {
    ":7100".to_string()
}

fn default_data_path() -> String {
    "data/releases.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cert_path() -> String {
    "certs/demo.crt".to_string()
}

fn default_key_path() -> String {
    "certs/demo.key".to_string()
}

fn default_true() -> bool {
    true
}

fn default_exempt() -> Vec<Operation> {
    Operation::ALL
        .into_iter()
        .filter(|op| op.admission() == Admission::Exempt)
        .collect()
}

fn default_credentials() -> Vec<CredentialEntry> {
    let demo = BasicCredential::demo();
    vec![CredentialEntry {
        username: demo.username,
        password: demo.password,
        valid: true,
    }]
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cert_path: default_cert_path(),
            key_path: default_key_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exempt: default_exempt(),
            credentials: default_credentials(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            data_path: default_data_path(),
            log_level: default_log_level(),
            tls: TlsConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: ServerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, or `None` if no file exists at `path`.
    ///
    /// Any other failure, including a TOML parse error, is returned so a
    /// broken file never silently falls back to the built-in credentials.
    pub fn load_if_present(path: &str) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => Ok(None),
                _ => Err(e),
            },
        }
    }

    /// The credential allow-list described by `auth.credentials`.
    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::from_credentials(self.auth.credentials.iter().map(|entry| {
            (
                BasicCredential::new(entry.username.clone(), entry.password.clone()),
                entry.valid,
            )
        }))
    }

    /// The admission chain run in front of every call.
    ///
    /// Empty when auth is disabled; calls are still logged.
    pub fn admission_chain(&self) -> AdmissionChain {
        let chain = AdmissionChain::new();
        if !self.auth.enabled {
            return chain;
        }
        let stage = CredentialStage::new(Arc::new(self.credential_store()))
            .with_exempt(self.auth.exempt.iter().copied());
        chain.with_stage(Arc::new(stage))
    }

    /// Build the RPC server config, reading TLS material if enabled.
    pub fn rpc_config(&self) -> Result<RpcConfig, RpcError> {
        let tls = if self.tls.enabled {
            Some(TlsIdentity::load(
                expand_tilde(&self.tls.cert_path),
                expand_tilde(&self.tls.key_path),
            )?)
        } else {
            None
        };
        Ok(RpcConfig {
            listen: self.listen.clone(),
            tls,
        })
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relcat_core::TokenStatus;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_setup() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, ":7100");
        assert!(config.tls.enabled);
        assert!(config.auth.enabled);
        assert_eq!(config.auth.exempt, vec![Operation::ListReleases]);

        let store = config.credential_store();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.check(&BasicCredential::demo().token()),
            TokenStatus::Valid
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.data_path, "data/releases.json");
        assert_eq!(config.tls.cert_path, "certs/demo.crt");
        assert_eq!(config.auth.credentials.len(), 1);
    }

    #[test]
    fn test_full_file_parses() {
        let config: ServerConfig = toml::from_str(
            r#"
            listen = "127.0.0.1:9100"
            data_path = "/srv/releases.json"
            log_level = "debug"

            [tls]
            enabled = false

            [auth]
            exempt = []

            [[auth.credentials]]
            username = "freddie"
            password = "mercury"

            [[auth.credentials]]
            username = "brian"
            password = "may"
            valid = false
            "#,
        )
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:9100");
        assert!(!config.tls.enabled);
        assert!(config.auth.exempt.is_empty());

        let store = config.credential_store();
        assert_eq!(
            store.check(&BasicCredential::new("freddie", "mercury").token()),
            TokenStatus::Valid
        );
        assert_eq!(
            store.check(&BasicCredential::new("brian", "may").token()),
            TokenStatus::Revoked
        );
        assert_eq!(
            store.check(&BasicCredential::demo().token()),
            TokenStatus::Unknown
        );
    }

    #[test]
    fn test_unknown_exempt_operation_is_rejected() {
        let result: Result<ServerConfig, _> = toml::from_str(
            r#"
            [auth]
            exempt = ["DeleteRelease"]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_admission_chain_follows_auth_enabled() {
        let mut config = ServerConfig::default();
        assert_eq!(config.admission_chain().len(), 1);

        config.auth.enabled = false;
        assert!(config.admission_chain().is_empty());
    }

    #[test]
    fn test_rpc_config_without_tls_skips_cert_loading() {
        let mut config = ServerConfig::default();
        config.tls.enabled = false;
        config.tls.cert_path = "/nonexistent/demo.crt".to_string();

        let rpc = config.rpc_config().unwrap();
        assert!(rpc.tls.is_none());
        assert_eq!(rpc.listen, ":7100");
    }

    #[test]
    fn test_rpc_config_with_missing_cert_fails() {
        let mut config = ServerConfig::default();
        config.tls.cert_path = "/nonexistent/demo.crt".to_string();
        assert!(matches!(config.rpc_config(), Err(RpcError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen = \":7200\"").unwrap();

        let config = ServerConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen, ":7200");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_file_is_absent_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relcat.toml");
        let loaded = ServerConfig::load_if_present(path.to_str().unwrap()).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [auth]
            exempt = []

            [[auth.credentials]]
            username = "scaramoucheX2
            password = "Can-you-do-the-fandango?"
            valid = false
            "#
        )
        .unwrap();

        let result = ServerConfig::load_if_present(file.path().to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_present_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\nexempt = []").unwrap();

        let config = ServerConfig::load_if_present(file.path().to_str().unwrap())
            .unwrap()
            .unwrap();
        assert!(config.auth.exempt.is_empty());
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("data/releases.json"), "data/releases.json");
        assert_eq!(expand_tilde("/etc/relcat.toml"), "/etc/relcat.toml");
    }
}
