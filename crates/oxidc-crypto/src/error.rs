//! Crypto error types.

/// Errors raised by key generation, signing, and the JWS/JWE codec.
///
/// Everything here is fatal at the layer it occurs: a failed signature is
/// never masked as valid, and a failed key generation aborts service start.
/// Verification and decryption failures deliberately carry no detail.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Key pair or symmetric key generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),
    /// Signature verification failed.
    #[error("signature verification failed")]
    Verification,
    /// Content or CEK encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),
    /// Decryption or tag authentication failed.
    #[error("decryption failed")]
    Decryption,
    /// The named algorithm is unknown or forbidden.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// The supplied key cannot be used with the requested algorithm.
    #[error("key does not match algorithm {algorithm}")]
    KeyMismatch {
        /// The algorithm the caller asked for.
        algorithm: String,
    },
    /// A compact serialization or header segment failed to parse.
    #[error("malformed token: {0}")]
    Malformed(String),
    /// No signing keys are available; the pool was never generated.
    #[error("no signing keys available")]
    NoKeysAvailable,
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
