//! JOSE algorithm vocabulary and the probed algorithm catalog.
//!
//! [`AlgorithmRegistry::bootstrap`] probes every candidate algorithm against
//! the runtime backend once at startup and keeps only the ones that
//! instantiate cleanly. A failed probe logs a warning and omits the entry;
//! bootstrap itself never aborts. Insertion order is preference order: the
//! first registered algorithm of a kind is the one
//! [`AlgorithmRegistry::preferred`] hands out.
//!
//! The `none` signature algorithm is forbidden and is never registered.

use aes_gcm::aead::KeyInit;
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use cbc::cipher::KeyIvInit;
use rand::rngs::OsRng;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::{debug, warn};

use crate::error::{CryptoError, CryptoResult};

/// JWS signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SignatureAlgorithm {
    /// ECDSA over P-521 with SHA-512.
    #[serde(rename = "ES512")]
    Es512,
    /// ECDSA over P-384 with SHA-384.
    #[serde(rename = "ES384")]
    Es384,
    /// ECDSA over P-256 with SHA-256.
    #[serde(rename = "ES256")]
    Es256,
    /// RSA PKCS#1 v1.5 with SHA-512.
    #[serde(rename = "RS512")]
    Rs512,
    /// RSA PKCS#1 v1.5 with SHA-384.
    #[serde(rename = "RS384")]
    Rs384,
    /// RSA PKCS#1 v1.5 with SHA-256.
    #[serde(rename = "RS256")]
    Rs256,
}

impl SignatureAlgorithm {
    /// All signature algorithms, in preference order.
    pub const ALL: [Self; 6] = [
        Self::Es512,
        Self::Es384,
        Self::Es256,
        Self::Rs512,
        Self::Rs384,
        Self::Rs256,
    ];

    /// The JWA name of this algorithm.
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::Es512 => "ES512",
            Self::Es384 => "ES384",
            Self::Es256 => "ES256",
            Self::Rs512 => "RS512",
            Self::Rs384 => "RS384",
            Self::Rs256 => "RS256",
        }
    }

    /// Parses a JWA name. `none` is rejected outright.
    pub fn from_jwa(name: &str) -> CryptoResult<Self> {
        match name {
            "ES512" => Ok(Self::Es512),
            "ES384" => Ok(Self::Es384),
            "ES256" => Ok(Self::Es256),
            "RS512" => Ok(Self::Rs512),
            "RS384" => Ok(Self::Rs384),
            "RS256" => Ok(Self::Rs256),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Whether this is an RSA algorithm.
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        matches!(self, Self::Rs512 | Self::Rs384 | Self::Rs256)
    }

    /// Whether this is an ECDSA algorithm.
    #[must_use]
    pub const fn is_ecdsa(self) -> bool {
        !self.is_rsa()
    }

    /// Key size in bits: the curve order for ECDSA, the minimum modulus
    /// for RSA.
    #[must_use]
    pub const fn key_size_bits(self) -> usize {
        match self {
            Self::Es512 => 521,
            Self::Es384 => 384,
            Self::Es256 => 256,
            Self::Rs512 | Self::Rs384 | Self::Rs256 => 2048,
        }
    }

    const fn native_name(self) -> &'static str {
        match self {
            Self::Es512 => "ECDSA-P521-SHA512",
            Self::Es384 => "ECDSA-P384-SHA384",
            Self::Es256 => "ECDSA-P256-SHA256",
            Self::Rs512 => "RSA-PKCS1-SHA512",
            Self::Rs384 => "RSA-PKCS1-SHA384",
            Self::Rs256 => "RSA-PKCS1-SHA256",
        }
    }
}

/// JWE content-encryption algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ContentEncryptionAlgorithm {
    /// AES-256 in GCM mode: 256-bit key, 96-bit IV, 128-bit tag.
    #[serde(rename = "A256GCM")]
    A256Gcm,
    /// AES-256 in CBC mode with PKCS#7 padding: 256-bit key, 128-bit IV.
    #[serde(rename = "A256CBC")]
    A256Cbc,
    /// AES-128 in GCM mode: 128-bit key, 96-bit IV, 128-bit tag.
    #[serde(rename = "A128GCM")]
    A128Gcm,
    /// AES-128 in CBC mode with PKCS#7 padding: 128-bit key, 128-bit IV.
    #[serde(rename = "A128CBC")]
    A128Cbc,
}

impl ContentEncryptionAlgorithm {
    /// All content-encryption algorithms, in preference order.
    pub const ALL: [Self; 4] = [Self::A256Gcm, Self::A256Cbc, Self::A128Gcm, Self::A128Cbc];

    /// The JWA name of this algorithm.
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::A256Gcm => "A256GCM",
            Self::A256Cbc => "A256CBC",
            Self::A128Gcm => "A128GCM",
            Self::A128Cbc => "A128CBC",
        }
    }

    /// Parses a JWA name.
    pub fn from_jwa(name: &str) -> CryptoResult<Self> {
        match name {
            "A256GCM" => Ok(Self::A256Gcm),
            "A256CBC" => Ok(Self::A256Cbc),
            "A128GCM" => Ok(Self::A128Gcm),
            "A128CBC" => Ok(Self::A128Cbc),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// CEK size in bits.
    #[must_use]
    pub const fn key_size_bits(self) -> usize {
        match self {
            Self::A256Gcm | Self::A256Cbc => 256,
            Self::A128Gcm | Self::A128Cbc => 128,
        }
    }

    /// CEK size in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        self.key_size_bits() / 8
    }

    /// IV size in bits.
    #[must_use]
    pub const fn iv_size_bits(self) -> usize {
        match self {
            Self::A256Gcm | Self::A128Gcm => 96,
            Self::A256Cbc | Self::A128Cbc => 128,
        }
    }

    /// IV size in bytes: the declared bit length divided by eight.
    #[must_use]
    pub const fn iv_len(self) -> usize {
        self.iv_size_bits() / 8
    }

    /// Authentication-tag size in bits; zero for the CBC modes, which
    /// produce no tag at this layer.
    #[must_use]
    pub const fn tag_size_bits(self) -> usize {
        match self {
            Self::A256Gcm | Self::A128Gcm => 128,
            Self::A256Cbc | Self::A128Cbc => 0,
        }
    }

    /// Tag size in bytes.
    #[must_use]
    pub const fn tag_len(self) -> usize {
        self.tag_size_bits() / 8
    }

    /// Whether this mode authenticates its output.
    #[must_use]
    pub const fn is_aead(self) -> bool {
        self.tag_size_bits() != 0
    }

    const fn native_name(self) -> &'static str {
        match self {
            Self::A256Gcm => "AES-256-GCM",
            Self::A256Cbc => "AES-256-CBC",
            Self::A128Gcm => "AES-128-GCM",
            Self::A128Cbc => "AES-128-CBC",
        }
    }
}

/// JWE key-management algorithms, used to wrap the content-encryption key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum KeyManagementAlgorithm {
    /// RSA PKCS#1 v1.5 key transport.
    #[serde(rename = "RSA1_5")]
    Rsa1_5,
    /// RSA OAEP with SHA-1 (the RFC 7518 default for `RSA-OAEP`).
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    /// RSA OAEP with SHA-256.
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
    /// Direct use of a shared symmetric key as the CEK.
    #[serde(rename = "dir")]
    Direct,
}

impl KeyManagementAlgorithm {
    /// The JWA name of this algorithm.
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::Rsa1_5 => "RSA1_5",
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaOaep256 => "RSA-OAEP-256",
            Self::Direct => "dir",
        }
    }

    /// Parses a JWA name.
    pub fn from_jwa(name: &str) -> CryptoResult<Self> {
        match name {
            "RSA1_5" => Ok(Self::Rsa1_5),
            "RSA-OAEP" => Ok(Self::RsaOaep),
            "RSA-OAEP-256" => Ok(Self::RsaOaep256),
            "dir" => Ok(Self::Direct),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Broad algorithm families in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    /// Content-encryption algorithms (JWE `enc` values).
    ContentEncryption,
    /// Digital-signature algorithms (JWS `alg` values).
    Signature,
}

/// Key material family an algorithm operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// RSA key pairs.
    Rsa,
    /// Elliptic-curve key pairs.
    Ec,
    /// Symmetric keys.
    Symmetric,
}

/// One catalog entry mapping a JOSE name to a native primitive.
#[derive(Debug, Clone)]
pub struct AlgorithmDescriptor {
    jose_name: &'static str,
    native_name: &'static str,
    kind: AlgorithmKind,
    key_type: KeyType,
    key_size_bits: usize,
    iv_len_bits: usize,
    tag_len_bits: usize,
}

impl AlgorithmDescriptor {
    /// The JWA name published in JOSE headers.
    #[must_use]
    pub const fn jose_name(&self) -> &'static str {
        self.jose_name
    }

    /// The name of the backing native primitive.
    #[must_use]
    pub const fn native_name(&self) -> &'static str {
        self.native_name
    }

    /// Which family of catalog entries this is.
    #[must_use]
    pub const fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    /// The key material family.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Key size in bits. For RSA signature algorithms this is the minimum
    /// modulus size; actual modulus size is a deployment decision.
    #[must_use]
    pub const fn key_size_bits(&self) -> usize {
        self.key_size_bits
    }

    /// Key size in bytes.
    #[must_use]
    pub const fn key_len(&self) -> usize {
        self.key_size_bits / 8
    }

    /// IV length in bits; zero for signature algorithms.
    #[must_use]
    pub const fn iv_len_bits(&self) -> usize {
        self.iv_len_bits
    }

    /// IV length in bytes: the declared bit length divided by eight.
    #[must_use]
    pub const fn iv_len(&self) -> usize {
        self.iv_len_bits / 8
    }

    /// Authentication-tag length in bits; zero for signature algorithms
    /// and for CBC content encryption.
    #[must_use]
    pub const fn tag_len_bits(&self) -> usize {
        self.tag_len_bits
    }

    /// Whether the algorithm authenticates its output.
    #[must_use]
    pub const fn is_aead(&self) -> bool {
        self.kind_is_content_encryption() && self.tag_len_bits != 0
    }

    const fn kind_is_content_encryption(&self) -> bool {
        matches!(self.kind, AlgorithmKind::ContentEncryption)
    }

    fn for_content_encryption(enc: ContentEncryptionAlgorithm) -> Self {
        Self {
            jose_name: enc.jwa_name(),
            native_name: enc.native_name(),
            kind: AlgorithmKind::ContentEncryption,
            key_type: KeyType::Symmetric,
            key_size_bits: enc.key_size_bits(),
            iv_len_bits: enc.iv_size_bits(),
            tag_len_bits: enc.tag_size_bits(),
        }
    }

    fn for_signature(alg: SignatureAlgorithm) -> Self {
        Self {
            jose_name: alg.jwa_name(),
            native_name: alg.native_name(),
            kind: AlgorithmKind::Signature,
            key_type: if alg.is_rsa() { KeyType::Rsa } else { KeyType::Ec },
            key_size_bits: alg.key_size_bits(),
            iv_len_bits: 0,
            tag_len_bits: 0,
        }
    }
}

/// Names that must never appear in the catalog.
const FORBIDDEN: &[&str] = &["none"];

/// Ordered catalog of the algorithms available in this process.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    entries: Vec<AlgorithmDescriptor>,
}

impl AlgorithmRegistry {
    /// Builds the catalog by probing every candidate against the runtime
    /// backend. Probe failures are logged and the entry omitted; bootstrap
    /// itself always succeeds.
    #[must_use]
    pub fn bootstrap() -> Self {
        let mut registry = Self::default();
        for enc in ContentEncryptionAlgorithm::ALL {
            registry.register_if_available(AlgorithmDescriptor::for_content_encryption(enc));
        }
        for alg in SignatureAlgorithm::ALL {
            registry.register_if_available(AlgorithmDescriptor::for_signature(alg));
        }
        registry
    }

    /// Probes the descriptor's primitive and appends the entry when the
    /// probe succeeds. Never aborts: a failure is logged and the entry is
    /// left out of the catalog.
    fn register_if_available(&mut self, descriptor: AlgorithmDescriptor) {
        if FORBIDDEN.contains(&descriptor.jose_name) {
            warn!(algorithm = descriptor.jose_name, "refusing forbidden algorithm");
            return;
        }
        match probe(&descriptor) {
            Ok(()) => {
                debug!(
                    algorithm = descriptor.jose_name,
                    native = descriptor.native_name,
                    "registered algorithm"
                );
                self.entries.push(descriptor);
            }
            Err(reason) => {
                warn!(
                    algorithm = descriptor.jose_name,
                    native = descriptor.native_name,
                    %reason,
                    "algorithm unavailable, omitting from catalog"
                );
            }
        }
    }

    /// Looks up a descriptor by its JWA name.
    #[must_use]
    pub fn find(&self, jose_name: &str) -> Option<&AlgorithmDescriptor> {
        self.entries.iter().find(|d| d.jose_name == jose_name)
    }

    /// Returns the most preferred available algorithm of the given kind.
    #[must_use]
    pub fn preferred(&self, kind: AlgorithmKind) -> Option<&AlgorithmDescriptor> {
        self.entries.iter().find(|d| d.kind == kind)
    }

    /// Iterates over the catalog in insertion (preference) order.
    pub fn iter(&self) -> impl Iterator<Item = &AlgorithmDescriptor> {
        self.entries.iter()
    }

    /// Number of registered algorithms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Instantiates the descriptor's native primitive with key material of the
/// declared sizes.
fn probe(descriptor: &AlgorithmDescriptor) -> Result<(), String> {
    match descriptor.kind {
        AlgorithmKind::ContentEncryption => probe_content_encryption(descriptor),
        AlgorithmKind::Signature => probe_signature(descriptor),
    }
}

fn probe_content_encryption(descriptor: &AlgorithmDescriptor) -> Result<(), String> {
    let key = vec![0u8; descriptor.key_len()];
    let iv = vec![0u8; descriptor.iv_len()];
    match descriptor.jose_name {
        "A256GCM" => {
            Aes256Gcm::new_from_slice(&key).map_err(|e| e.to_string())?;
            probe_gcm_lengths(descriptor)
        }
        "A128GCM" => {
            Aes128Gcm::new_from_slice(&key).map_err(|e| e.to_string())?;
            probe_gcm_lengths(descriptor)
        }
        "A256CBC" => {
            cbc::Encryptor::<aes::Aes256>::new_from_slices(&key, &iv)
                .map_err(|e| e.to_string())?;
            Ok(())
        }
        "A128CBC" => {
            cbc::Encryptor::<aes::Aes128>::new_from_slices(&key, &iv)
                .map_err(|e| e.to_string())?;
            Ok(())
        }
        other => Err(format!("no native content encryption for {other}")),
    }
}

fn probe_gcm_lengths(descriptor: &AlgorithmDescriptor) -> Result<(), String> {
    if descriptor.iv_len() != 12 {
        return Err(format!(
            "GCM takes a 12-byte nonce, descriptor declares {}",
            descriptor.iv_len()
        ));
    }
    if descriptor.tag_len_bits() != 128 {
        return Err(format!(
            "GCM produces a 128-bit tag, descriptor declares {}",
            descriptor.tag_len_bits()
        ));
    }
    Ok(())
}

fn probe_signature(descriptor: &AlgorithmDescriptor) -> Result<(), String> {
    use p256::ecdsa::signature::Signer;
    match descriptor.jose_name {
        "ES256" => {
            let key = p256::ecdsa::SigningKey::random(&mut OsRng);
            let _: p256::ecdsa::Signature = key.sign(b"probe");
            Ok(())
        }
        "ES384" => {
            let key = p384::ecdsa::SigningKey::random(&mut OsRng);
            let _: p384::ecdsa::Signature = key.sign(b"probe");
            Ok(())
        }
        "ES512" => {
            let key = p521::ecdsa::SigningKey::random(&mut OsRng);
            let _: p521::ecdsa::Signature = key.sign(b"probe");
            Ok(())
        }
        "RS256" => {
            let _ = Pkcs1v15Sign::new::<Sha256>();
            let _ = Sha256::digest(b"probe");
            Ok(())
        }
        "RS384" => {
            let _ = Pkcs1v15Sign::new::<Sha384>();
            let _ = Sha384::digest(b"probe");
            Ok(())
        }
        "RS512" => {
            let _ = Pkcs1v15Sign::new::<Sha512>();
            let _ = Sha512::digest(b"probe");
            Ok(())
        }
        other => Err(format!("no native signature primitive for {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_registers_the_full_catalog() {
        let registry = AlgorithmRegistry::bootstrap();
        assert_eq!(registry.len(), 10);
        for name in [
            "A256GCM", "A256CBC", "A128GCM", "A128CBC", "ES512", "ES384", "ES256", "RS512",
            "RS384", "RS256",
        ] {
            assert!(registry.find(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn insertion_order_is_preference_order() {
        let registry = AlgorithmRegistry::bootstrap();
        let names: Vec<&str> = registry.iter().map(AlgorithmDescriptor::jose_name).collect();
        assert_eq!(
            names,
            vec![
                "A256GCM", "A256CBC", "A128GCM", "A128CBC", "ES512", "ES384", "ES256", "RS512",
                "RS384", "RS256",
            ]
        );
    }

    #[test]
    fn preferred_picks_the_first_of_each_kind() {
        let registry = AlgorithmRegistry::bootstrap();
        let enc = registry.preferred(AlgorithmKind::ContentEncryption).unwrap();
        assert_eq!(enc.jose_name(), "A256GCM");
        let sig = registry.preferred(AlgorithmKind::Signature).unwrap();
        assert_eq!(sig.jose_name(), "ES512");
    }

    #[test]
    fn gcm_descriptor_sizes_are_bit_accurate() {
        let registry = AlgorithmRegistry::bootstrap();
        let gcm = registry.find("A256GCM").unwrap();
        assert_eq!(gcm.key_len(), 32);
        assert_eq!(gcm.iv_len_bits(), 96);
        assert_eq!(gcm.iv_len(), 12);
        assert_eq!(gcm.tag_len_bits(), 128);
        assert!(gcm.is_aead());
    }

    #[test]
    fn cbc_descriptor_has_sixteen_byte_iv_and_no_tag() {
        let registry = AlgorithmRegistry::bootstrap();
        let cbc = registry.find("A256CBC").unwrap();
        assert_eq!(cbc.iv_len(), 16);
        assert_eq!(cbc.tag_len_bits(), 0);
        assert!(!cbc.is_aead());
    }

    #[test]
    fn none_is_never_in_the_catalog() {
        let registry = AlgorithmRegistry::bootstrap();
        assert!(registry.find("none").is_none());
    }

    #[test]
    fn registering_none_is_refused() {
        let mut registry = AlgorithmRegistry::default();
        registry.register_if_available(AlgorithmDescriptor {
            jose_name: "none",
            native_name: "none",
            kind: AlgorithmKind::Signature,
            key_type: KeyType::Rsa,
            key_size_bits: 0,
            iv_len_bits: 0,
            tag_len_bits: 0,
        });
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_probe_omits_the_entry_without_aborting() {
        let mut registry = AlgorithmRegistry::default();
        // Declares a 100-bit key for AES-256-GCM; the cipher rejects it.
        registry.register_if_available(AlgorithmDescriptor {
            jose_name: "A256GCM",
            native_name: "AES-256-GCM",
            kind: AlgorithmKind::ContentEncryption,
            key_type: KeyType::Symmetric,
            key_size_bits: 100,
            iv_len_bits: 96,
            tag_len_bits: 128,
        });
        assert!(registry.is_empty());
        // A good descriptor still registers afterwards.
        registry.register_if_available(AlgorithmDescriptor::for_content_encryption(
            ContentEncryptionAlgorithm::A256Gcm,
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn signature_from_jwa_rejects_none() {
        let err = SignatureAlgorithm::from_jwa("none").unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn signature_jwa_names_round_trip() {
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(SignatureAlgorithm::from_jwa(alg.jwa_name()).unwrap(), alg);
        }
    }

    #[test]
    fn content_encryption_jwa_names_round_trip() {
        for enc in ContentEncryptionAlgorithm::ALL {
            assert_eq!(
                ContentEncryptionAlgorithm::from_jwa(enc.jwa_name()).unwrap(),
                enc
            );
        }
    }

    #[test]
    fn key_management_jwa_names_round_trip() {
        for alg in [
            KeyManagementAlgorithm::Rsa1_5,
            KeyManagementAlgorithm::RsaOaep,
            KeyManagementAlgorithm::RsaOaep256,
            KeyManagementAlgorithm::Direct,
        ] {
            assert_eq!(
                KeyManagementAlgorithm::from_jwa(alg.jwa_name()).unwrap(),
                alg
            );
        }
    }

    #[test]
    fn iv_lengths_derive_from_bits() {
        assert_eq!(ContentEncryptionAlgorithm::A256Gcm.iv_len(), 12);
        assert_eq!(ContentEncryptionAlgorithm::A128Gcm.iv_len(), 12);
        assert_eq!(ContentEncryptionAlgorithm::A256Cbc.iv_len(), 16);
        assert_eq!(ContentEncryptionAlgorithm::A128Cbc.iv_len(), 16);
    }
}
