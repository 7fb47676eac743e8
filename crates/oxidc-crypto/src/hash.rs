//! Digest helpers.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::algorithm::SignatureAlgorithm;

/// Computes a SHA-256 hash of the input data.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// Computes a SHA-384 hash of the input data.
#[must_use]
pub fn sha384(data: &[u8]) -> Vec<u8> {
    Sha384::digest(data).to_vec()
}

/// Computes a SHA-512 hash of the input data.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    Sha512::digest(data).to_vec()
}

/// Token-binding hash: the `at_hash` / `c_hash` claim value.
///
/// Hashes the token with the hash function of the ID token's signature
/// algorithm and keeps the base64url-encoded left half of the digest.
#[must_use]
pub fn token_hash(algorithm: SignatureAlgorithm, token: &str) -> String {
    let digest = match algorithm {
        SignatureAlgorithm::Rs256 | SignatureAlgorithm::Es256 => sha256(token.as_bytes()),
        SignatureAlgorithm::Rs384 | SignatureAlgorithm::Es384 => sha384(token.as_bytes()),
        SignatureAlgorithm::Rs512 | SignatureAlgorithm::Es512 => sha512(token.as_bytes()),
    };
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}
