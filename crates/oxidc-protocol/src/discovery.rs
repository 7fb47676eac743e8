//! Discovery metadata assembly.
//!
//! The document is computed, not configured: endpoint URLs derive from the
//! issuer and the configured paths, and the advertised algorithm lists come
//! straight from the availability-probed catalog, so a primitive that
//! failed its probe at bootstrap never shows up here.

use serde::{Deserialize, Serialize};

use oxidc_core::Config;
use oxidc_crypto::{AlgorithmKind, AlgorithmRegistry};

/// The subset of OpenID Provider Metadata this provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer identifier; also the `iss` claim of every id token.
    pub issuer: String,
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    pub token_endpoint: String,
    /// Userinfo endpoint URL.
    pub userinfo_endpoint: String,
    /// Public signing-key set URL.
    pub jwks_uri: String,
    /// Response types the authorization endpoint accepts.
    pub response_types_supported: Vec<String>,
    /// Subject identifier types.
    pub subject_types_supported: Vec<String>,
    /// Grant types the token endpoint accepts.
    pub grant_types_supported: Vec<String>,
    /// Scopes this provider understands.
    pub scopes_supported: Vec<String>,
    /// JWS algorithms available for id tokens, preference order first.
    pub id_token_signing_alg_values_supported: Vec<String>,
    /// JWE content-encryption algorithms available, preference order first.
    pub id_token_encryption_enc_values_supported: Vec<String>,
    /// Client authentication methods at the token endpoint.
    pub token_endpoint_auth_methods_supported: Vec<String>,
}

impl ProviderMetadata {
    /// Assembles the document from configuration and the probed catalog.
    #[must_use]
    pub fn from_config(config: &Config, registry: &AlgorithmRegistry) -> Self {
        let base = config.provider.issuer.trim_end_matches('/');
        let endpoint = |path: &str| format!("{base}{path}");
        Self {
            issuer: config.provider.issuer.clone(),
            authorization_endpoint: endpoint(&config.provider.authorization_path),
            token_endpoint: endpoint(&config.provider.token_path),
            userinfo_endpoint: endpoint(&config.provider.userinfo_path),
            jwks_uri: endpoint(&config.provider.jwks_path),
            response_types_supported: vec!["code".to_owned()],
            subject_types_supported: vec!["public".to_owned()],
            grant_types_supported: vec!["authorization_code".to_owned()],
            scopes_supported: config.provider.scopes_supported.clone(),
            id_token_signing_alg_values_supported: advertised(registry, AlgorithmKind::Signature),
            id_token_encryption_enc_values_supported: advertised(
                registry,
                AlgorithmKind::ContentEncryption,
            ),
            token_endpoint_auth_methods_supported: vec!["client_secret_basic".to_owned()],
        }
    }
}

fn advertised(registry: &AlgorithmRegistry, kind: AlgorithmKind) -> Vec<String> {
    registry
        .iter()
        .filter(|descriptor| descriptor.kind() == kind)
        .map(|descriptor| descriptor.jose_name().to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ProviderMetadata {
        ProviderMetadata::from_config(&Config::default(), &AlgorithmRegistry::bootstrap())
    }

    #[test]
    fn endpoints_derive_from_the_issuer() {
        let doc = metadata();
        assert_eq!(doc.issuer, "https://localhost:8443");
        assert_eq!(doc.authorization_endpoint, "https://localhost:8443/authorize");
        assert_eq!(doc.token_endpoint, "https://localhost:8443/token");
        assert_eq!(doc.userinfo_endpoint, "https://localhost:8443/userinfo");
        assert_eq!(doc.jwks_uri, "https://localhost:8443/jwks");
    }

    #[test]
    fn a_trailing_issuer_slash_does_not_double_up() {
        let mut config = Config::default();
        config.provider.issuer = "https://op.example/".to_owned();
        let doc = ProviderMetadata::from_config(&config, &AlgorithmRegistry::bootstrap());
        assert_eq!(doc.jwks_uri, "https://op.example/jwks");
    }

    #[test]
    fn algorithm_lists_follow_catalog_preference_order() {
        let doc = metadata();
        assert_eq!(doc.id_token_signing_alg_values_supported[0], "ES512");
        assert!(doc
            .id_token_signing_alg_values_supported
            .contains(&"RS256".to_owned()));
        assert_eq!(doc.id_token_encryption_enc_values_supported[0], "A256GCM");
        assert!(!doc
            .id_token_signing_alg_values_supported
            .contains(&"none".to_owned()));
    }

    #[test]
    fn code_flow_is_the_only_advertised_flow() {
        let doc = metadata();
        assert_eq!(doc.response_types_supported, ["code"]);
        assert_eq!(doc.grant_types_supported, ["authorization_code"]);
    }

    #[test]
    fn the_document_serializes_with_standard_member_names() {
        let serialized = serde_json::to_string(&metadata()).unwrap();
        assert!(serialized.contains("\"issuer\""));
        assert!(serialized.contains("\"jwks_uri\""));
        assert!(serialized.contains("\"id_token_signing_alg_values_supported\""));
    }
}
