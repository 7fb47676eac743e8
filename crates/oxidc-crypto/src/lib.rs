//! # oxidc-crypto
//!
//! JOSE primitives for the oxidc identity provider: the probed algorithm
//! catalog, RSA/ECDSA signing keys, CSPRNG helpers, and the compact JWS/JWE
//! codec.
//!
//! ## Layering
//!
//! - [`algorithm`] - typed JWA algorithms and the [`AlgorithmRegistry`]
//!   catalog, built once at startup by probing the runtime backend
//! - [`keys`] - signing-key wrappers with JWKS component export
//! - [`jws`] / [`jwe`] - codec functions producing and consuming the
//!   3-segment and 5-segment compact serializations
//! - [`random`] - opaque-token and IV generation
//!
//! All failures surface as [`CryptoError`]; a signature or decryption
//! failure is never reported as success.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod error;
pub mod hash;
pub mod jose;
pub mod jwe;
pub mod jws;
pub mod keys;
pub mod random;

pub use algorithm::{
    AlgorithmDescriptor, AlgorithmKind, AlgorithmRegistry, ContentEncryptionAlgorithm,
    KeyManagementAlgorithm, KeyType, SignatureAlgorithm,
};
pub use error::{CryptoError, CryptoResult};
pub use jose::JoseHeader;
pub use jwe::{build_jwe, decrypt_compact_jwe, decrypt_jwe, JweDecryptionKey, JweParts, JweRecipient};
pub use jws::{build_jws, sign_compact_jws, verify_jws, JwsParts};
pub use keys::{EcdsaSigningKey, RsaSigningKey, SigningKey};
pub use random::next_token;
