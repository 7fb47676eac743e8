//! Process-wide signing state: the rotating RSA pool, its JWKS
//! projections, and the symmetric service key for opaque payloads.
//!
//! The pool lives behind one `RwLock`. [`generate_keys`] builds a complete
//! replacement off to the side and swaps it in with a single write lock;
//! signing and verification take read locks, so rotation is atomic from
//! their point of view — a reader sees the old pool or the new one, never
//! a mix. Tokens and opaque payloads minted before a rotation stop
//! validating after it, which is the intended consequence of rotating.
//!
//! [`generate_keys`]: KeyService::generate_keys

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::Rng;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use oxidc_core::KeyConfig;
use oxidc_crypto::random::random_bytes;
use oxidc_crypto::{
    build_jwe, decrypt_compact_jwe, verify_jws, AlgorithmKind, AlgorithmRegistry,
    ContentEncryptionAlgorithm, CryptoError, CryptoResult, JoseHeader, JweDecryptionKey,
    JweRecipient, KeyManagementAlgorithm, RsaSigningKey, SignatureAlgorithm, SigningKey as _,
};

use crate::jwks::{JsonWebKey, JsonWebKeySet};

/// The signing-key service.
pub struct KeyService {
    registry: Arc<AlgorithmRegistry>,
    state: RwLock<Option<KeyPool>>,
}

struct KeyPool {
    keys: Vec<ManagedKey>,
    service_key: Zeroizing<Vec<u8>>,
    content_encryption: ContentEncryptionAlgorithm,
}

struct ManagedKey {
    key: RsaSigningKey,
    // JWS header segment cached at generation time; every signature with
    // this key reuses it byte for byte.
    encoded_header: String,
}

impl KeyService {
    /// Creates a service with no keys. [`generate_keys`] must run before
    /// any signing operation.
    ///
    /// [`generate_keys`]: KeyService::generate_keys
    #[must_use]
    pub fn new(registry: Arc<AlgorithmRegistry>) -> Self {
        Self {
            registry,
            state: RwLock::new(None),
        }
    }

    /// Generates a fresh pool of `pool_size` RSA keys plus a fresh service
    /// key, then swaps them in atomically. On any generation failure the
    /// previous pool stays in place untouched.
    pub fn generate_keys(&self, config: &KeyConfig) -> CryptoResult<()> {
        if config.pool_size == 0 {
            return Err(CryptoError::KeyGeneration(
                "pool size must be at least 1".to_string(),
            ));
        }
        let algorithm = SignatureAlgorithm::from_jwa(&config.signature_algorithm)?;
        let content_encryption = self.select_content_encryption(config);

        let mut keys = Vec::with_capacity(config.pool_size);
        for _ in 0..config.pool_size {
            let key = RsaSigningKey::generate(config.modulus_bits, algorithm).map_err(|e| {
                error!("signing key generation failed: {e}");
                e
            })?;
            let encoded_header = JoseHeader::jws(algorithm, key.key_id()).encode()?;
            debug!(kid = key.key_id(), "generated signing key");
            keys.push(ManagedKey {
                key,
                encoded_header,
            });
        }
        let service_key = Zeroizing::new(random_bytes(content_encryption.key_len()));

        *self.write() = Some(KeyPool {
            keys,
            service_key,
            content_encryption,
        });
        info!(
            pool_size = config.pool_size,
            algorithm = algorithm.jwa_name(),
            "signing pool rotated"
        );
        Ok(())
    }

    /// Signs a claim set as a compact JWS with a randomly chosen pool key.
    /// The chosen key's `kid` travels in the header.
    pub fn sign(&self, claims: &serde_json::Value) -> CryptoResult<String> {
        let guard = self.read();
        let pool = guard.as_ref().ok_or(CryptoError::NoKeysAvailable)?;
        let managed = &pool.keys[rand::thread_rng().gen_range(0..pool.keys.len())];
        debug!(kid = managed.key.key_id(), "signing with pool key");

        let payload = serde_json::to_vec(claims)
            .map_err(|e| CryptoError::Malformed(format!("claims serialization: {e}")))?;
        let signing_input = format!(
            "{}.{}",
            managed.encoded_header,
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = managed.key.sign(signing_input.as_bytes())?;
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verifies a compact JWS against the current pool and returns its
    /// claims. The header `kid` selects the key; tokens signed before the
    /// last rotation no longer verify.
    pub fn verify(&self, compact: &str) -> CryptoResult<serde_json::Value> {
        let guard = self.read();
        let pool = guard.as_ref().ok_or(CryptoError::NoKeysAvailable)?;

        let header_segment = compact.split('.').next().unwrap_or("");
        let header = JoseHeader::decode(header_segment)?;
        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| CryptoError::Malformed("token header missing kid".to_string()))?;
        let managed = pool
            .keys
            .iter()
            .find(|managed| managed.key.key_id() == kid)
            .ok_or(CryptoError::Verification)?;

        let payload = verify_jws(compact, &managed.key)?;
        serde_json::from_slice(&payload)
            .map_err(|e| CryptoError::Malformed(format!("claims: {e}")))
    }

    /// The public signing set served at the JWKS endpoint. Empty before
    /// the first [`generate_keys`].
    ///
    /// [`generate_keys`]: KeyService::generate_keys
    #[must_use]
    pub fn jwks(&self) -> JsonWebKeySet {
        let guard = self.read();
        let keys = guard
            .as_ref()
            .map(|pool| {
                pool.keys
                    .iter()
                    .map(|managed| JsonWebKey::public_rsa(&managed.key))
                    .collect()
            })
            .unwrap_or_default();
        JsonWebKeySet::new(keys)
    }

    /// The private projection of the pool, for callers inside the trust
    /// boundary. Never serve this.
    #[must_use]
    pub fn private_jwks(&self) -> JsonWebKeySet {
        let guard = self.read();
        let keys = guard
            .as_ref()
            .map(|pool| {
                pool.keys
                    .iter()
                    .map(|managed| JsonWebKey::private_rsa(&managed.key))
                    .collect()
            })
            .unwrap_or_default();
        JsonWebKeySet::new(keys)
    }

    /// Seals an opaque payload under the current service key as a compact
    /// direct-encryption JWE.
    pub fn encrypt_opaque(&self, payload: &[u8]) -> CryptoResult<String> {
        let guard = self.read();
        let pool = guard.as_ref().ok_or(CryptoError::NoKeysAvailable)?;
        let header = JoseHeader::jwe(
            KeyManagementAlgorithm::Direct,
            pool.content_encryption,
            None,
        );
        let parts = build_jwe(&header, payload, &JweRecipient::Direct(&pool.service_key))?;
        Ok(parts.to_compact(&header.encode()?))
    }

    /// Opens a payload sealed by [`encrypt_opaque`] under the current
    /// service key.
    ///
    /// [`encrypt_opaque`]: KeyService::encrypt_opaque
    pub fn decrypt_opaque(&self, compact: &str) -> CryptoResult<Vec<u8>> {
        let guard = self.read();
        let pool = guard.as_ref().ok_or(CryptoError::NoKeysAvailable)?;
        decrypt_compact_jwe(compact, &JweDecryptionKey::Direct(&pool.service_key))
    }

    /// Drops the pool and service key. Every signing and sealing operation
    /// fails with [`CryptoError::NoKeysAvailable`] until the next
    /// [`generate_keys`].
    ///
    /// [`generate_keys`]: KeyService::generate_keys
    pub fn clear(&self) {
        *self.write() = None;
        info!("signing pool cleared");
    }

    fn select_content_encryption(&self, config: &KeyConfig) -> ContentEncryptionAlgorithm {
        match ContentEncryptionAlgorithm::from_jwa(&config.content_encryption) {
            Ok(enc) if self.registry.find(enc.jwa_name()).is_some() => enc,
            _ => {
                let fallback = self
                    .registry
                    .preferred(AlgorithmKind::ContentEncryption)
                    .and_then(|descriptor| {
                        ContentEncryptionAlgorithm::from_jwa(descriptor.jose_name()).ok()
                    })
                    .unwrap_or(ContentEncryptionAlgorithm::A256Gcm);
                warn!(
                    configured = config.content_encryption.as_str(),
                    fallback = fallback.jwa_name(),
                    "configured content encryption unavailable"
                );
                fallback
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<KeyPool>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<KeyPool>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(pool_size: usize) -> KeyConfig {
        KeyConfig {
            pool_size,
            modulus_bits: 1024,
            signature_algorithm: "RS256".to_owned(),
            content_encryption: "A256GCM".to_owned(),
        }
    }

    fn service() -> KeyService {
        KeyService::new(Arc::new(AlgorithmRegistry::bootstrap()))
    }

    fn header_of(compact: &str) -> JoseHeader {
        JoseHeader::decode(compact.split('.').next().unwrap()).unwrap()
    }

    #[test]
    fn signing_before_key_generation_fails() {
        let keys = service();
        assert!(matches!(
            keys.sign(&json!({"sub": "alice"})),
            Err(CryptoError::NoKeysAvailable)
        ));
        assert!(keys.jwks().is_empty());
    }

    #[test]
    fn jwks_always_contains_the_kid_of_every_signature() {
        let keys = service();
        keys.generate_keys(&config(2)).unwrap();

        for _ in 0..8 {
            let token = keys.sign(&json!({"sub": "alice"})).unwrap();
            let header = header_of(&token);
            let kid = header.kid.unwrap();
            let jwk = keys.jwks().find(&kid).cloned().unwrap();
            assert_eq!(jwk.alg, "RS256");
            assert_eq!(jwk.public_key_use, "sig");
        }
    }

    #[test]
    fn sign_verify_round_trip() {
        let keys = service();
        keys.generate_keys(&config(1)).unwrap();

        let claims = json!({"sub": "alice", "aud": "client-1"});
        let token = keys.sign(&claims).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), claims);
    }

    #[test]
    fn rotation_invalidates_earlier_tokens() {
        let keys = service();
        keys.generate_keys(&config(1)).unwrap();
        let before = keys.sign(&json!({"sub": "alice"})).unwrap();
        let old_kid = header_of(&before).kid.unwrap();

        keys.generate_keys(&config(1)).unwrap();
        assert!(keys.verify(&before).is_err());
        assert!(keys.jwks().find(&old_kid).is_none());

        let after = keys.sign(&json!({"sub": "alice"})).unwrap();
        assert!(keys.verify(&after).is_ok());
    }

    #[test]
    fn empty_pool_size_is_rejected() {
        let keys = service();
        assert!(matches!(
            keys.generate_keys(&config(0)),
            Err(CryptoError::KeyGeneration(_))
        ));
    }

    #[test]
    fn non_rsa_pool_algorithms_are_rejected() {
        let keys = service();
        let mut bad = config(1);
        bad.signature_algorithm = "ES256".to_owned();
        assert!(matches!(
            keys.generate_keys(&bad),
            Err(CryptoError::KeyMismatch { .. })
        ));

        bad.signature_algorithm = "none".to_owned();
        assert!(matches!(
            keys.generate_keys(&bad),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn private_jwks_carries_private_exponents() {
        let keys = service();
        keys.generate_keys(&config(1)).unwrap();

        let public = keys.jwks();
        let private = keys.private_jwks();
        assert_eq!(public.len(), 1);
        assert!(public.keys[0].d.is_none());
        assert_eq!(private.keys[0].public_key_use, "enc");
        assert!(private.keys[0].d.is_some());
    }

    #[test]
    fn opaque_payloads_round_trip_under_the_service_key() {
        let keys = service();
        keys.generate_keys(&config(1)).unwrap();

        let sealed = keys.encrypt_opaque(b"session-state").unwrap();
        let segments: Vec<&str> = sealed.split('.').collect();
        assert_eq!(segments.len(), 5);
        assert!(segments[1].is_empty());
        assert_eq!(header_of(&sealed).enc.as_deref(), Some("A256GCM"));

        assert_eq!(keys.decrypt_opaque(&sealed).unwrap(), b"session-state");
    }

    #[test]
    fn rotation_replaces_the_service_key() {
        let keys = service();
        keys.generate_keys(&config(1)).unwrap();
        let sealed = keys.encrypt_opaque(b"state").unwrap();

        keys.generate_keys(&config(1)).unwrap();
        assert!(keys.decrypt_opaque(&sealed).is_err());
    }

    #[test]
    fn unavailable_content_encryption_falls_back_to_preferred() {
        let keys = service();
        let mut odd = config(1);
        odd.content_encryption = "A512GCM".to_owned();
        keys.generate_keys(&odd).unwrap();

        let sealed = keys.encrypt_opaque(b"state").unwrap();
        assert_eq!(header_of(&sealed).enc.as_deref(), Some("A256GCM"));
    }

    #[test]
    fn clear_tears_the_pool_down() {
        let keys = service();
        keys.generate_keys(&config(1)).unwrap();
        keys.clear();

        assert!(keys.jwks().is_empty());
        assert!(matches!(
            keys.sign(&json!({"sub": "alice"})),
            Err(CryptoError::NoKeysAvailable)
        ));
    }

    #[test]
    fn tokens_from_another_pool_do_not_verify() {
        let ours = service();
        ours.generate_keys(&config(1)).unwrap();
        let theirs = service();
        theirs.generate_keys(&config(1)).unwrap();

        let token = theirs.sign(&json!({"sub": "alice"})).unwrap();
        assert!(matches!(
            ours.verify(&token),
            Err(CryptoError::Verification)
        ));
    }
}
