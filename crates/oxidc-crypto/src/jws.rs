//! Compact JWS building and verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::{CryptoError, CryptoResult};
use crate::jose::JoseHeader;
use crate::keys::SigningKey;

/// The computed pieces of a JWS: the exact signed bytes and the signature
/// over them.
#[derive(Debug, Clone)]
pub struct JwsParts {
    /// `base64url(header) "." base64url(payload)` - the ASCII signing
    /// input.
    pub signing_input: String,
    /// Raw signature bytes over the signing input.
    pub signature: Vec<u8>,
}

impl JwsParts {
    /// Assembles the 3-segment compact serialization.
    #[must_use]
    pub fn into_compact(self) -> String {
        format!(
            "{}.{}",
            self.signing_input,
            URL_SAFE_NO_PAD.encode(self.signature)
        )
    }
}

/// Builds the signing input from `header` and `payload` and signs it.
///
/// The header's `alg` must match the key's algorithm; a mismatch is an
/// error, never a silent fallback to a different primitive.
pub fn build_jws(
    header: &JoseHeader,
    payload: &[u8],
    key: &dyn SigningKey,
) -> CryptoResult<JwsParts> {
    if header.alg != key.algorithm().jwa_name() {
        return Err(CryptoError::KeyMismatch {
            algorithm: header.alg.clone(),
        });
    }
    let signing_input = format!("{}.{}", header.encode()?, URL_SAFE_NO_PAD.encode(payload));
    let signature = key.sign(signing_input.as_bytes())?;
    Ok(JwsParts {
        signing_input,
        signature,
    })
}

/// Builds and assembles a compact JWS in one step.
pub fn sign_compact_jws(
    header: &JoseHeader,
    payload: &[u8],
    key: &dyn SigningKey,
) -> CryptoResult<String> {
    Ok(build_jws(header, payload, key)?.into_compact())
}

/// Verifies a compact JWS against `key` and returns the decoded payload.
pub fn verify_jws(compact: &str, key: &dyn SigningKey) -> CryptoResult<Vec<u8>> {
    let segments: Vec<&str> = compact.split('.').collect();
    if segments.len() != 3 {
        return Err(CryptoError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    let header = JoseHeader::decode(segments[0])?;
    if header.alg != key.algorithm().jwa_name() {
        return Err(CryptoError::KeyMismatch { algorithm: header.alg });
    }
    let signing_input = &compact[..segments[0].len() + 1 + segments[1].len()];
    let signature = URL_SAFE_NO_PAD
        .decode(segments[2])
        .map_err(|e| CryptoError::Malformed(format!("signature encoding: {e}")))?;
    key.verify(signing_input.as_bytes(), &signature)?;
    URL_SAFE_NO_PAD
        .decode(segments[1])
        .map_err(|e| CryptoError::Malformed(format!("payload encoding: {e}")))
}
