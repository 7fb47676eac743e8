//! JOSE header construction and encoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::algorithm::{ContentEncryptionAlgorithm, KeyManagementAlgorithm, SignatureAlgorithm};
use crate::error::{CryptoError, CryptoResult};

/// JOSE header for the JWS and JWE compact serializations.
///
/// Constructed once per token and treated as immutable afterwards: its
/// base64url encoding is both the first compact segment and, for AEAD
/// content encryption, the additional authenticated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoseHeader {
    /// Signature algorithm (JWS) or key-management algorithm (JWE).
    pub alg: String,
    /// Content-encryption algorithm; present only in JWE headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enc: Option<String>,
    /// Identifier of the signing or wrapping key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl JoseHeader {
    /// Builds a JWS header carrying the algorithm and key id.
    #[must_use]
    pub fn jws(algorithm: SignatureAlgorithm, kid: impl Into<String>) -> Self {
        Self {
            alg: algorithm.jwa_name().to_string(),
            enc: None,
            kid: Some(kid.into()),
        }
    }

    /// Builds a JWE header carrying the key-management and
    /// content-encryption algorithms.
    #[must_use]
    pub fn jwe(
        alg: KeyManagementAlgorithm,
        enc: ContentEncryptionAlgorithm,
        kid: Option<String>,
    ) -> Self {
        Self {
            alg: alg.jwa_name().to_string(),
            enc: Some(enc.jwa_name().to_string()),
            kid,
        }
    }

    /// Returns the base64url encoding of the JSON header.
    pub fn encode(&self) -> CryptoResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| CryptoError::Malformed(format!("header serialization: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Parses a header from its base64url compact segment.
    pub fn decode(segment: &str) -> CryptoResult<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| CryptoError::Malformed(format!("header encoding: {e}")))?;
        serde_json::from_slice(&json)
            .map_err(|e| CryptoError::Malformed(format!("header JSON: {e}")))
    }
}
