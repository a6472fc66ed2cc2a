//! Access gate
//!
//! Decides who is making a request before anything reaches the store.
//! The gate only authenticates: once a caller is identified, every record
//! is reachable. There are no per-record ownership checks.
//!
//! Tokens are never stored in the clear. The config keeps
//! base64url(SHA-256(token)) and presented tokens are hashed and compared
//! in constant time.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use crate::config::AccessConfig;

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
}

/// Why a request was turned away
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,
}

/// A configured API token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiToken {
    /// Who the token identifies
    pub user: String,
    /// base64url(SHA-256(token)), see `hash_token`
    pub token_hash: String,
}

/// Request authentication
pub trait AccessGate {
    /// Identify the caller presenting `token`, or reject the request
    fn identify(&self, token: Option<&str>) -> Result<Identity, AccessError>;
}

/// Accepts any of a fixed set of hashed tokens
pub struct TokenGate {
    tokens: Vec<ApiToken>,
}

impl TokenGate {
    pub fn new(tokens: Vec<ApiToken>) -> Self {
        Self { tokens }
    }
}

impl AccessGate for TokenGate {
    fn identify(&self, token: Option<&str>) -> Result<Identity, AccessError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AccessError::MissingToken)?;
        let presented = hash_token(token);

        let matched = self
            .tokens
            .iter()
            .find(|t| constant_time_str_eq(&t.token_hash, &presented))
            .ok_or(AccessError::InvalidToken)?;

        debug!("Authenticated request for {}", matched.user);
        Ok(Identity {
            user: matched.user.clone(),
        })
    }
}

/// Trusts the local operating system session
///
/// Used when no tokens are configured: whoever can run the binary against
/// the data directory is already authenticated by the OS.
pub struct LocalGate {
    user: String,
}

impl LocalGate {
    pub fn new() -> Self {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "local".to_string());
        Self { user }
    }
}

impl Default for LocalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessGate for LocalGate {
    fn identify(&self, _token: Option<&str>) -> Result<Identity, AccessError> {
        Ok(Identity {
            user: self.user.clone(),
        })
    }
}

/// Pick the gate matching the access settings
pub fn gate_for(config: &AccessConfig) -> Box<dyn AccessGate> {
    if config.tokens.is_empty() {
        Box::new(LocalGate::new())
    } else {
        Box::new(TokenGate::new(config.tokens.clone()))
    }
}

/// Generate a cryptographically secure random token
///
/// Returns a 256-bit (32-byte) random value as base64url.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a token for storage using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, result)
}

fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with(token: &str) -> TokenGate {
        TokenGate::new(vec![ApiToken {
            user: "sales".to_string(),
            token_hash: hash_token(token),
        }])
    }

    #[test]
    fn test_token_gate_accepts_known_token() {
        let gate = gate_with("s3cret");
        let identity = gate.identify(Some("s3cret")).unwrap();
        assert_eq!(identity.user, "sales");
    }

    #[test]
    fn test_token_gate_rejects() {
        let gate = gate_with("s3cret");
        assert_eq!(gate.identify(None), Err(AccessError::MissingToken));
        assert_eq!(gate.identify(Some("")), Err(AccessError::MissingToken));
        assert_eq!(gate.identify(Some("guess")), Err(AccessError::InvalidToken));
    }

    #[test]
    fn test_local_gate_always_identifies() {
        let gate = LocalGate::new();
        assert!(gate.identify(None).is_ok());
        assert!(gate.identify(Some("anything")).is_ok());
    }

    #[test]
    fn test_gate_for_config() {
        let open = gate_for(&AccessConfig::default());
        assert!(open.identify(None).is_ok());

        let locked = gate_for(&AccessConfig {
            tokens: vec![ApiToken {
                user: "ops".to_string(),
                token_hash: hash_token("t"),
            }],
        });
        assert!(locked.identify(None).is_err());
        assert_eq!(locked.identify(Some("t")).unwrap().user, "ops");
    }

    #[test]
    fn test_generate_token_is_random() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes base64url without padding
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_hash_token_is_stable_and_not_plaintext() {
        let h1 = hash_token("abc");
        let h2 = hash_token("abc");
        assert_eq!(h1, h2);
        assert_ne!(h1, "abc");
        assert_ne!(h1, hash_token("abd"));
    }
}
