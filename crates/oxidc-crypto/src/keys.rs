//! Signing-key primitives.
//!
//! Wraps RSA and ECDSA key pairs together with their key id and the JWS
//! algorithm they sign with. Private material never leaves a wrapper except
//! through the explicit component exports used to build the internal JWKS
//! projection.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use p256::ecdsa::signature::{Signer, Verifier};
use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::algorithm::SignatureAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use crate::random;

/// Common surface of the signing-key wrappers.
pub trait SigningKey: Send + Sync {
    /// The JWS algorithm this key signs with.
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Key identifier published in JOSE headers and JWKS entries.
    fn key_id(&self) -> &str;

    /// Signs the raw message bytes.
    fn sign(&self, message: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Verifies a signature over the raw message bytes.
    fn verify(&self, message: &[u8], signature: &[u8]) -> CryptoResult<()>;
}

/// RSA key pair bound to one of the `RS*` algorithms.
pub struct RsaSigningKey {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    key_id: String,
    algorithm: SignatureAlgorithm,
}

impl RsaSigningKey {
    /// Generates a fresh key pair with the given modulus size and assigns
    /// it a random unguessable key id.
    pub fn generate(bits: usize, algorithm: SignatureAlgorithm) -> CryptoResult<Self> {
        if !algorithm.is_rsa() {
            return Err(CryptoError::KeyMismatch {
                algorithm: algorithm.jwa_name().to_string(),
            });
        }
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self {
            private,
            public,
            key_id: random::next_token(),
            algorithm,
        })
    }

    /// Replaces the generated key id; intended for callers that manage
    /// their own identifiers.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = key_id.into();
        self
    }

    /// Public modulus, base64url big-endian.
    #[must_use]
    pub fn modulus(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.public.n().to_bytes_be())
    }

    /// Public exponent, base64url big-endian.
    #[must_use]
    pub fn public_exponent(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.public.e().to_bytes_be())
    }

    /// Private exponent, base64url big-endian.
    ///
    /// Feeds the internal JWKS projection only; the caller is responsible
    /// for keeping that document behind the trust boundary.
    #[must_use]
    pub fn private_exponent(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.private.d().to_bytes_be())
    }
}

impl SigningKey for RsaSigningKey {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        let (padding, digest) = rsa_padding_and_digest(self.algorithm, message)?;
        self.private
            .sign(padding, &digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        let (padding, digest) = rsa_padding_and_digest(self.algorithm, message)?;
        self.public
            .verify(padding, &digest, signature)
            .map_err(|_| CryptoError::Verification)
    }
}

impl fmt::Debug for RsaSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

fn rsa_padding_and_digest(
    algorithm: SignatureAlgorithm,
    message: &[u8],
) -> CryptoResult<(Pkcs1v15Sign, Vec<u8>)> {
    match algorithm {
        SignatureAlgorithm::Rs256 => Ok((
            Pkcs1v15Sign::new::<Sha256>(),
            Sha256::digest(message).to_vec(),
        )),
        SignatureAlgorithm::Rs384 => Ok((
            Pkcs1v15Sign::new::<Sha384>(),
            Sha384::digest(message).to_vec(),
        )),
        SignatureAlgorithm::Rs512 => Ok((
            Pkcs1v15Sign::new::<Sha512>(),
            Sha512::digest(message).to_vec(),
        )),
        other => Err(CryptoError::KeyMismatch {
            algorithm: other.jwa_name().to_string(),
        }),
    }
}

enum EcKeyPair {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
}

/// Elliptic-curve key pair bound to one of the `ES*` algorithms.
///
/// Signatures are the fixed-width `r || s` concatenation JWS requires, not
/// DER.
pub struct EcdsaSigningKey {
    key: EcKeyPair,
    key_id: String,
    algorithm: SignatureAlgorithm,
}

impl EcdsaSigningKey {
    /// Generates a fresh key pair on the algorithm's curve and assigns it a
    /// random unguessable key id.
    pub fn generate(algorithm: SignatureAlgorithm) -> CryptoResult<Self> {
        let key = match algorithm {
            SignatureAlgorithm::Es256 => {
                EcKeyPair::P256(p256::ecdsa::SigningKey::random(&mut OsRng))
            }
            SignatureAlgorithm::Es384 => {
                EcKeyPair::P384(p384::ecdsa::SigningKey::random(&mut OsRng))
            }
            SignatureAlgorithm::Es512 => {
                EcKeyPair::P521(p521::ecdsa::SigningKey::random(&mut OsRng))
            }
            other => {
                return Err(CryptoError::KeyMismatch {
                    algorithm: other.jwa_name().to_string(),
                })
            }
        };
        Ok(Self {
            key,
            key_id: random::next_token(),
            algorithm,
        })
    }

    /// Replaces the generated key id.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = key_id.into();
        self
    }

    /// The JWK curve name, e.g. `P-256`.
    #[must_use]
    pub fn curve_name(&self) -> &'static str {
        match self.key {
            EcKeyPair::P256(_) => "P-256",
            EcKeyPair::P384(_) => "P-384",
            EcKeyPair::P521(_) => "P-521",
        }
    }

    /// Public point coordinates `(x, y)`, base64url at the curve's field
    /// width.
    pub fn public_coordinates(&self) -> CryptoResult<(String, String)> {
        let (x, y) = match &self.key {
            EcKeyPair::P256(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                (
                    point.x().map(|c| c.to_vec()),
                    point.y().map(|c| c.to_vec()),
                )
            }
            EcKeyPair::P384(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                (
                    point.x().map(|c| c.to_vec()),
                    point.y().map(|c| c.to_vec()),
                )
            }
            EcKeyPair::P521(key) => {
                // p521 0.13 gates `verifying_key()` behind a feature that is
                // never enabled by `ecdsa`; the `From` conversion is the same
                // operation without the gate.
                let point = p521::ecdsa::VerifyingKey::from(key).to_encoded_point(false);
                (
                    point.x().map(|c| c.to_vec()),
                    point.y().map(|c| c.to_vec()),
                )
            }
        };
        match (x, y) {
            (Some(x), Some(y)) => Ok((URL_SAFE_NO_PAD.encode(x), URL_SAFE_NO_PAD.encode(y))),
            _ => Err(CryptoError::Malformed(
                "public point has no affine coordinates".to_string(),
            )),
        }
    }

    /// Private scalar, base64url at the curve's field width. Same trust
    /// boundary as [`RsaSigningKey::private_exponent`].
    #[must_use]
    pub fn private_scalar(&self) -> String {
        match &self.key {
            EcKeyPair::P256(key) => URL_SAFE_NO_PAD.encode(key.to_bytes()),
            EcKeyPair::P384(key) => URL_SAFE_NO_PAD.encode(key.to_bytes()),
            EcKeyPair::P521(key) => URL_SAFE_NO_PAD.encode(key.to_bytes()),
        }
    }
}

impl SigningKey for EcdsaSigningKey {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        match &self.key {
            EcKeyPair::P256(key) => {
                let signature: p256::ecdsa::Signature = key.sign(message);
                Ok(signature.to_bytes().to_vec())
            }
            EcKeyPair::P384(key) => {
                let signature: p384::ecdsa::Signature = key.sign(message);
                Ok(signature.to_bytes().to_vec())
            }
            EcKeyPair::P521(key) => {
                let signature: p521::ecdsa::Signature = key.sign(message);
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        match &self.key {
            EcKeyPair::P256(key) => {
                let signature = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CryptoError::Verification)?;
                key.verifying_key()
                    .verify(message, &signature)
                    .map_err(|_| CryptoError::Verification)
            }
            EcKeyPair::P384(key) => {
                let signature = p384::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CryptoError::Verification)?;
                key.verifying_key()
                    .verify(message, &signature)
                    .map_err(|_| CryptoError::Verification)
            }
            EcKeyPair::P521(key) => {
                let signature = p521::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CryptoError::Verification)?;
                p521::ecdsa::VerifyingKey::from(key)
                    .verify(message, &signature)
                    .map_err(|_| CryptoError::Verification)
            }
        }
    }
}

impl fmt::Debug for EcdsaSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("curve", &self.curve_name())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsa_sign_verify_round_trip() {
        let key = RsaSigningKey::generate(1024, SignatureAlgorithm::Rs256).unwrap();
        let signature = key.sign(b"message").unwrap();
        key.verify(b"message", &signature).unwrap();
    }

    #[test]
    fn rsa_rejects_tampered_message_and_signature() {
        let key = RsaSigningKey::generate(1024, SignatureAlgorithm::Rs256).unwrap();
        let mut signature = key.sign(b"message").unwrap();
        assert!(key.verify(b"messagE", &signature).is_err());
        signature[0] ^= 0x01;
        assert!(key.verify(b"message", &signature).is_err());
    }

    #[test]
    fn rsa_generate_rejects_ecdsa_algorithms() {
        let err = RsaSigningKey::generate(1024, SignatureAlgorithm::Es256).unwrap_err();
        assert!(matches!(err, CryptoError::KeyMismatch { .. }));
    }

    #[test]
    fn rsa_components_decode_to_modulus_width() {
        let key = RsaSigningKey::generate(1024, SignatureAlgorithm::Rs384).unwrap();
        let n = URL_SAFE_NO_PAD.decode(key.modulus()).unwrap();
        assert_eq!(n.len(), 128);
        let e = URL_SAFE_NO_PAD.decode(key.public_exponent()).unwrap();
        assert!(!e.is_empty());
        let d = URL_SAFE_NO_PAD.decode(key.private_exponent()).unwrap();
        assert!(!d.is_empty());
    }

    #[test]
    fn ecdsa_sign_verify_round_trip_per_curve() {
        for algorithm in [
            SignatureAlgorithm::Es256,
            SignatureAlgorithm::Es384,
            SignatureAlgorithm::Es512,
        ] {
            let key = EcdsaSigningKey::generate(algorithm).unwrap();
            let signature = key.sign(b"message").unwrap();
            key.verify(b"message", &signature).unwrap();
            assert!(key.verify(b"other", &signature).is_err());
        }
    }

    #[test]
    fn ecdsa_signature_is_fixed_width() {
        let key = EcdsaSigningKey::generate(SignatureAlgorithm::Es256).unwrap();
        assert_eq!(key.sign(b"m").unwrap().len(), 64);
        let key = EcdsaSigningKey::generate(SignatureAlgorithm::Es512).unwrap();
        assert_eq!(key.sign(b"m").unwrap().len(), 132);
    }

    #[test]
    fn ecdsa_generate_rejects_rsa_algorithms() {
        let err = EcdsaSigningKey::generate(SignatureAlgorithm::Rs256).unwrap_err();
        assert!(matches!(err, CryptoError::KeyMismatch { .. }));
    }

    #[test]
    fn ecdsa_coordinates_decode_to_field_width() {
        let key = EcdsaSigningKey::generate(SignatureAlgorithm::Es256).unwrap();
        let (x, y) = key.public_coordinates().unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(x).unwrap().len(), 32);
        assert_eq!(URL_SAFE_NO_PAD.decode(y).unwrap().len(), 32);
        assert_eq!(key.curve_name(), "P-256");

        let key = EcdsaSigningKey::generate(SignatureAlgorithm::Es512).unwrap();
        let (x, y) = key.public_coordinates().unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(x).unwrap().len(), 66);
        assert_eq!(URL_SAFE_NO_PAD.decode(y).unwrap().len(), 66);
    }

    #[test]
    fn key_ids_are_random_and_unguessable_length() {
        let a = RsaSigningKey::generate(1024, SignatureAlgorithm::Rs256).unwrap();
        let b = RsaSigningKey::generate(1024, SignatureAlgorithm::Rs256).unwrap();
        assert_ne!(a.key_id(), b.key_id());
        assert_eq!(a.key_id().len(), 43);
    }

    #[test]
    fn debug_output_redacts_private_material() {
        let key = RsaSigningKey::generate(1024, SignatureAlgorithm::Rs256).unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains(key.key_id()));
    }
}
