//! Configuration for the oxidc provider core.
//!
//! The whole tree deserializes from JSON; every section and field falls back
//! to its default when absent, so an empty object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents were not valid configuration JSON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Main configuration structure for the provider core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Issuer identity and endpoint layout.
    pub provider: ProviderConfig,
    /// Signing-key pool and algorithm selection.
    pub keys: KeyConfig,
    /// Lifetimes of issued artifacts.
    pub tokens: TokenConfig,
}

/// Issuer identity and endpoint layout.
///
/// Endpoint paths are joined onto the issuer when the discovery document is
/// assembled; the core itself never binds them to a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Issuer identifier, also the base URL for all endpoint paths.
    pub issuer: String,
    /// Whether requests must arrive over a secure channel. Waiving this
    /// skips the transport checks on every surface; meant for deployments
    /// that terminate TLS in front of the embedding process.
    pub require_secure_transport: bool,
    /// Path of the authorization endpoint.
    pub authorization_path: String,
    /// Path of the token endpoint.
    pub token_path: String,
    /// Path of the userinfo endpoint.
    pub userinfo_path: String,
    /// Path of the JWKS document.
    pub jwks_path: String,
    /// Scopes advertised in the discovery document.
    pub scopes_supported: Vec<String>,
}

/// Signing-key pool and algorithm selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Number of signing keys kept live in the pool.
    pub pool_size: usize,
    /// RSA modulus size in bits for pool keys.
    pub modulus_bits: usize,
    /// JWS algorithm the pool signs with.
    pub signature_algorithm: String,
    /// JWE content-encryption algorithm for opaque payloads.
    pub content_encryption: String,
}

/// Lifetimes of issued artifacts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Authorization-code lifetime.
    pub code_lifetime_secs: u32,
    /// Access-token lifetime.
    pub access_token_lifetime_secs: u32,
    /// Refresh-token lifetime.
    pub refresh_token_lifetime_secs: u32,
    /// ID-token lifetime.
    pub id_token_lifetime_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            keys: KeyConfig::default(),
            tokens: TokenConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            issuer: "https://localhost:8443".to_string(),
            require_secure_transport: true,
            authorization_path: "/authorize".to_string(),
            token_path: "/token".to_string(),
            userinfo_path: "/userinfo".to_string(),
            jwks_path: "/jwks".to_string(),
            scopes_supported: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            pool_size: 3,
            modulus_bits: 2048,
            signature_algorithm: "RS256".to_string(),
            content_encryption: "A256GCM".to_string(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            code_lifetime_secs: 120,
            access_token_lifetime_secs: 300,
            refresh_token_lifetime_secs: 1800,
            id_token_lifetime_secs: 300,
        }
    }
}

impl Config {
    /// Loads the configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&contents)?)
    }

    /// Parses the configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
