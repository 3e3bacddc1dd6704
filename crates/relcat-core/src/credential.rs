// crates/relcat-core/src/credential.rs
//
// Basic-auth style credentials and the token allow-list used by the
// server's credential admission stage.
//
// The token is base64("username:password"). This is a reversible encoding,
// not a hash: anyone who knows the scheme can forge a token. It is only
// suitable over an encrypted channel and only for demonstration setups.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Prefix of the `authorization` metadata value, as in HTTP Basic auth.
pub const BASIC_PREFIX: &str = "Basic ";

/// Username of the built-in demo credential.
pub const DEMO_USERNAME: &str = "scaramoucheX2";

/// Password of the built-in demo credential.
pub const DEMO_PASSWORD: &str = "Can-you-do-the-fandango?";

/// A username/password pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The built-in demo credential.
    pub fn demo() -> Self {
        Self::new(DEMO_USERNAME, DEMO_PASSWORD)
    }

    /// The opaque token: base64("username:password").
    pub fn token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }

    /// The full `authorization` metadata value: "Basic <token>".
    pub fn authorization_value(&self) -> String {
        format!("{}{}", BASIC_PREFIX, self.token())
    }
}

/// Extract the token from an `authorization` value.
///
/// Returns `None` when the value does not carry the "Basic " prefix.
pub fn strip_basic_prefix(value: &str) -> Option<&str> {
    value.strip_prefix(BASIC_PREFIX)
}

/// Result of looking a token up in a [`CredentialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Known and currently accepted.
    Valid,
    /// Known but marked invalid (revoked).
    Revoked,
    /// Not present in the store.
    Unknown,
}

/// Allow-list of credential tokens.
///
/// Tokens map to a validity flag rather than forming a plain set, so a
/// token can be known but revoked. The store is built once and then only
/// read.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    tokens: HashMap<String, bool>,
}

impl CredentialStore {
    /// An empty store. Every token is `Unknown`.
    pub fn empty() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// Build a store from `(credential, valid)` pairs. Later entries for
    /// the same credential win.
    pub fn from_credentials<I>(credentials: I) -> Self
    where
        I: IntoIterator<Item = (BasicCredential, bool)>,
    {
        let tokens = credentials
            .into_iter()
            .map(|(credential, valid)| (credential.token(), valid))
            .collect();
        Self { tokens }
    }

    /// Add a credential with the given validity flag.
    pub fn with_credential(mut self, credential: &BasicCredential, valid: bool) -> Self {
        self.tokens.insert(credential.token(), valid);
        self
    }

    /// Look up a raw token.
    pub fn check(&self, token: &str) -> TokenStatus {
        match self.tokens.get(token) {
            Some(true) => TokenStatus::Valid,
            Some(false) => TokenStatus::Revoked,
            None => TokenStatus::Unknown,
        }
    }

    /// Number of known tokens (valid or revoked).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for CredentialStore {
    /// A store holding exactly the demo credential, marked valid.
    fn default() -> Self {
        Self::empty().with_credential(&BasicCredential::demo(), true)
    }
}
