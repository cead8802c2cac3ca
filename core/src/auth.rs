//! Request signing for the catalog API.
//!
//! Every call carries `apikey`, `ts` and `hash`, where `hash` is the
//! lowercase hex MD5 of `ts + private_key + public_key`. The private key
//! itself is never sent and never printed.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};

/// A private key that redacts itself in `Debug` and `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Public/private key pair issued by the catalog provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub public_key: String,
    pub private_key: SecretKey,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: SecretKey::new(private_key),
        }
    }

    /// Sign a request for the given nonce.
    pub fn sign(&self, ts: &str) -> AuthParams {
        AuthParams {
            apikey: self.public_key.clone(),
            ts: ts.to_string(),
            hash: digest(ts, self.private_key.expose(), &self.public_key),
        }
    }

    /// Sign with the current time as nonce.
    pub fn sign_now(&self) -> AuthParams {
        self.sign(&timestamp_millis())
    }
}

/// The three authentication query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthParams {
    pub apikey: String,
    pub ts: String,
    pub hash: String,
}

impl AuthParams {
    /// Query pairs in wire order: `apikey`, `ts`, `hash`.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        vec![
            ("apikey".to_string(), self.apikey),
            ("ts".to_string(), self.ts),
            ("hash".to_string(), self.hash),
        ]
    }
}

/// Lowercase hex MD5 of `ts + private_key + public_key`.
pub fn digest(ts: &str, private_key: &str, public_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(ts.as_bytes());
    hasher.update(private_key.as_bytes());
    hasher.update(public_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Milliseconds since the Unix epoch, rendered as a decimal string.
pub fn timestamp_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}
