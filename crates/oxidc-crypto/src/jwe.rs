//! Compact JWE building and decryption.
//!
//! A fresh content-encryption key (CEK) is generated per message and
//! wrapped for the recipient with the header's key-management algorithm;
//! direct encryption (`dir`) uses the shared symmetric key as the CEK and
//! leaves the encrypted-CEK segment empty. The IV is drawn fresh from the
//! CSPRNG at the algorithm's declared bit length divided by eight.
//!
//! The GCM modes authenticate the encoded header (passed as AAD) and the
//! payload, yielding a detached 128-bit tag. The CBC modes produce no tag
//! at this layer: an implementation targeting full interoperability must
//! compose a separate MAC over the ciphertext.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::algorithm::{ContentEncryptionAlgorithm, KeyManagementAlgorithm};
use crate::error::{CryptoError, CryptoResult};
use crate::jose::JoseHeader;
use crate::random;

/// The four computed components of a JWE, returned separately; the caller
/// assembles the compact serialization.
#[derive(Debug, Clone)]
pub struct JweParts {
    /// CEK wrapped for the recipient; empty for direct encryption.
    pub encrypted_cek: Vec<u8>,
    /// Fresh per-message initialization vector.
    pub iv: Vec<u8>,
    /// Ciphertext over the payload.
    pub ciphertext: Vec<u8>,
    /// Detached authentication tag; empty for the CBC modes.
    pub tag: Vec<u8>,
}

impl JweParts {
    /// Assembles the 5-segment compact serialization
    /// `header.encryptedCek.iv.ciphertext.tag`.
    #[must_use]
    pub fn to_compact(&self, encoded_header: &str) -> String {
        format!(
            "{}.{}.{}.{}.{}",
            encoded_header,
            URL_SAFE_NO_PAD.encode(&self.encrypted_cek),
            URL_SAFE_NO_PAD.encode(&self.iv),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
            URL_SAFE_NO_PAD.encode(&self.tag)
        )
    }
}

/// Recipient key material for CEK wrapping.
#[derive(Debug)]
pub enum JweRecipient<'a> {
    /// RSA public-key transport (`RSA1_5`, `RSA-OAEP`, `RSA-OAEP-256`).
    Rsa(&'a RsaPublicKey),
    /// Shared symmetric key used directly as the CEK (`dir`).
    Direct(&'a [u8]),
}

/// Recipient-side key material for CEK unwrapping.
#[derive(Debug)]
pub enum JweDecryptionKey<'a> {
    /// RSA private key matching the wrapping public key.
    Rsa(&'a RsaPrivateKey),
    /// The shared symmetric key (`dir`).
    Direct(&'a [u8]),
}

/// Encrypts `payload` for `recipient` according to the header's `alg` and
/// `enc` values.
pub fn build_jwe(
    header: &JoseHeader,
    payload: &[u8],
    recipient: &JweRecipient<'_>,
) -> CryptoResult<JweParts> {
    let alg = KeyManagementAlgorithm::from_jwa(&header.alg)?;
    let enc = content_encryption(header)?;
    let encoded_header = header.encode()?;

    let (cek, encrypted_cek) = wrap_cek(alg, enc, recipient, &header.alg)?;
    let iv = random::random_bytes(enc.iv_len());
    let (ciphertext, tag) = encrypt_content(enc, &cek, &iv, payload, encoded_header.as_bytes())?;
    Ok(JweParts {
        encrypted_cek,
        iv,
        ciphertext,
        tag,
    })
}

/// Decrypts the components of a JWE. `encoded_header` must be the exact
/// first compact segment: it selects the algorithms and is the AAD the GCM
/// tag was computed over.
pub fn decrypt_jwe(
    encoded_header: &str,
    parts: &JweParts,
    key: &JweDecryptionKey<'_>,
) -> CryptoResult<Vec<u8>> {
    let header = JoseHeader::decode(encoded_header)?;
    let alg = KeyManagementAlgorithm::from_jwa(&header.alg)?;
    let enc = content_encryption(&header)?;
    if parts.iv.len() != enc.iv_len() || parts.tag.len() != enc.tag_len() {
        return Err(CryptoError::Decryption);
    }
    let cek = unwrap_cek(alg, enc, parts, key, &header.alg)?;
    decrypt_content(
        enc,
        &cek,
        &parts.iv,
        &parts.ciphertext,
        &parts.tag,
        encoded_header.as_bytes(),
    )
}

/// Splits a compact JWE and decrypts it.
pub fn decrypt_compact_jwe(compact: &str, key: &JweDecryptionKey<'_>) -> CryptoResult<Vec<u8>> {
    let segments: Vec<&str> = compact.split('.').collect();
    if segments.len() != 5 {
        return Err(CryptoError::Malformed(format!(
            "expected 5 segments, found {}",
            segments.len()
        )));
    }
    let parts = JweParts {
        encrypted_cek: decode_segment(segments[1], "encrypted CEK")?,
        iv: decode_segment(segments[2], "IV")?,
        ciphertext: decode_segment(segments[3], "ciphertext")?,
        tag: decode_segment(segments[4], "authentication tag")?,
    };
    decrypt_jwe(segments[0], &parts, key)
}

fn decode_segment(segment: &str, what: &str) -> CryptoResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| CryptoError::Malformed(format!("{what} encoding: {e}")))
}

fn content_encryption(header: &JoseHeader) -> CryptoResult<ContentEncryptionAlgorithm> {
    let enc = header
        .enc
        .as_deref()
        .ok_or_else(|| CryptoError::Malformed("JWE header missing enc".to_string()))?;
    ContentEncryptionAlgorithm::from_jwa(enc)
}

fn wrap_cek(
    alg: KeyManagementAlgorithm,
    enc: ContentEncryptionAlgorithm,
    recipient: &JweRecipient<'_>,
    alg_name: &str,
) -> CryptoResult<(Zeroizing<Vec<u8>>, Vec<u8>)> {
    match (alg, recipient) {
        (KeyManagementAlgorithm::Direct, JweRecipient::Direct(key)) => {
            if key.len() != enc.key_len() {
                return Err(CryptoError::Encryption(format!(
                    "direct key must be {} bytes for {}",
                    enc.key_len(),
                    enc.jwa_name()
                )));
            }
            Ok((Zeroizing::new(key.to_vec()), Vec::new()))
        }
        (KeyManagementAlgorithm::Rsa1_5, JweRecipient::Rsa(public)) => {
            let cek = Zeroizing::new(random::random_bytes(enc.key_len()));
            let wrapped = public
                .encrypt(&mut OsRng, Pkcs1v15Encrypt, cek.as_slice())
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            Ok((cek, wrapped))
        }
        (KeyManagementAlgorithm::RsaOaep, JweRecipient::Rsa(public)) => {
            let cek = Zeroizing::new(random::random_bytes(enc.key_len()));
            let wrapped = public
                .encrypt(&mut OsRng, Oaep::new::<Sha1>(), cek.as_slice())
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            Ok((cek, wrapped))
        }
        (KeyManagementAlgorithm::RsaOaep256, JweRecipient::Rsa(public)) => {
            let cek = Zeroizing::new(random::random_bytes(enc.key_len()));
            let wrapped = public
                .encrypt(&mut OsRng, Oaep::new::<Sha256>(), cek.as_slice())
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            Ok((cek, wrapped))
        }
        _ => Err(CryptoError::KeyMismatch {
            algorithm: alg_name.to_string(),
        }),
    }
}

fn unwrap_cek(
    alg: KeyManagementAlgorithm,
    enc: ContentEncryptionAlgorithm,
    parts: &JweParts,
    key: &JweDecryptionKey<'_>,
    alg_name: &str,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let cek = match (alg, key) {
        (KeyManagementAlgorithm::Direct, JweDecryptionKey::Direct(shared)) => {
            if !parts.encrypted_cek.is_empty() {
                return Err(CryptoError::Malformed(
                    "direct encryption carries no encrypted CEK".to_string(),
                ));
            }
            Zeroizing::new(shared.to_vec())
        }
        (KeyManagementAlgorithm::Rsa1_5, JweDecryptionKey::Rsa(private)) => Zeroizing::new(
            private
                .decrypt(Pkcs1v15Encrypt, &parts.encrypted_cek)
                .map_err(|_| CryptoError::Decryption)?,
        ),
        (KeyManagementAlgorithm::RsaOaep, JweDecryptionKey::Rsa(private)) => Zeroizing::new(
            private
                .decrypt(Oaep::new::<Sha1>(), &parts.encrypted_cek)
                .map_err(|_| CryptoError::Decryption)?,
        ),
        (KeyManagementAlgorithm::RsaOaep256, JweDecryptionKey::Rsa(private)) => Zeroizing::new(
            private
                .decrypt(Oaep::new::<Sha256>(), &parts.encrypted_cek)
                .map_err(|_| CryptoError::Decryption)?,
        ),
        _ => {
            return Err(CryptoError::KeyMismatch {
                algorithm: alg_name.to_string(),
            })
        }
    };
    if cek.len() != enc.key_len() {
        return Err(CryptoError::Decryption);
    }
    Ok(cek)
}

fn encrypt_content(
    enc: ContentEncryptionAlgorithm,
    cek: &[u8],
    iv: &[u8],
    payload: &[u8],
    aad: &[u8],
) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
    match enc {
        ContentEncryptionAlgorithm::A256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(cek)
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            let mut sealed = cipher
                .encrypt(Nonce::from_slice(iv), Payload { msg: payload, aad })
                .map_err(|_| CryptoError::Encryption("AEAD encryption failed".to_string()))?;
            let tag = sealed.split_off(sealed.len() - enc.tag_len());
            Ok((sealed, tag))
        }
        ContentEncryptionAlgorithm::A128Gcm => {
            let cipher = Aes128Gcm::new_from_slice(cek)
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            let mut sealed = cipher
                .encrypt(Nonce::from_slice(iv), Payload { msg: payload, aad })
                .map_err(|_| CryptoError::Encryption("AEAD encryption failed".to_string()))?;
            let tag = sealed.split_off(sealed.len() - enc.tag_len());
            Ok((sealed, tag))
        }
        ContentEncryptionAlgorithm::A256Cbc => {
            let cipher = cbc::Encryptor::<aes::Aes256>::new_from_slices(cek, iv)
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            Ok((cipher.encrypt_padded_vec_mut::<Pkcs7>(payload), Vec::new()))
        }
        ContentEncryptionAlgorithm::A128Cbc => {
            let cipher = cbc::Encryptor::<aes::Aes128>::new_from_slices(cek, iv)
                .map_err(|e| CryptoError::Encryption(e.to_string()))?;
            Ok((cipher.encrypt_padded_vec_mut::<Pkcs7>(payload), Vec::new()))
        }
    }
}

fn decrypt_content(
    enc: ContentEncryptionAlgorithm,
    cek: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    match enc {
        ContentEncryptionAlgorithm::A256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(cek).map_err(|_| CryptoError::Decryption)?;
            let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
            sealed.extend_from_slice(ciphertext);
            sealed.extend_from_slice(tag);
            cipher
                .decrypt(Nonce::from_slice(iv), Payload { msg: &sealed, aad })
                .map_err(|_| CryptoError::Decryption)
        }
        ContentEncryptionAlgorithm::A128Gcm => {
            let cipher = Aes128Gcm::new_from_slice(cek).map_err(|_| CryptoError::Decryption)?;
            let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
            sealed.extend_from_slice(ciphertext);
            sealed.extend_from_slice(tag);
            cipher
                .decrypt(Nonce::from_slice(iv), Payload { msg: &sealed, aad })
                .map_err(|_| CryptoError::Decryption)
        }
        ContentEncryptionAlgorithm::A256Cbc => {
            let cipher = cbc::Decryptor::<aes::Aes256>::new_from_slices(cek, iv)
                .map_err(|_| CryptoError::Decryption)?;
            cipher
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CryptoError::Decryption)
        }
        ContentEncryptionAlgorithm::A128Cbc => {
            let cipher = cbc::Decryptor::<aes::Aes128>::new_from_slices(cek, iv)
                .map_err(|_| CryptoError::Decryption)?;
            cipher
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CryptoError::Decryption)
        }
    }
}
