//! JSON Web Key Set projections of signing keys.
//!
//! Two projections exist per pool: the public set (`use` = `sig`) that the
//! JWKS endpoint publishes, and the private set (`use` = `enc`) that backs
//! service-internal decryption. The private projection carries the private
//! exponent or scalar in `d` and must never cross the trust boundary.

use oxidc_crypto::{CryptoResult, EcdsaSigningKey, RsaSigningKey, SigningKey as _};
use serde::{Deserialize, Serialize};

/// One JSON Web Key, RSA or EC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type: `RSA` or `EC`.
    pub kty: String,
    /// Key identifier, matched against JOSE header `kid` values.
    pub kid: String,
    /// Intended use: `sig` for the public set, `enc` for the private set.
    #[serde(rename = "use")]
    pub public_key_use: String,
    /// JWA signature algorithm the key is bound to.
    pub alg: String,
    /// RSA modulus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Private exponent (RSA) or private scalar (EC); private set only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// EC curve name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// EC public point x coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC public point y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl JsonWebKey {
    /// Public signing projection of an RSA key.
    #[must_use]
    pub fn public_rsa(key: &RsaSigningKey) -> Self {
        Self {
            kty: "RSA".to_owned(),
            kid: key.key_id().to_owned(),
            public_key_use: "sig".to_owned(),
            alg: key.algorithm().jwa_name().to_owned(),
            n: Some(key.modulus()),
            e: Some(key.public_exponent()),
            d: None,
            crv: None,
            x: None,
            y: None,
        }
    }

    /// Private projection of an RSA key, including the private exponent.
    #[must_use]
    pub fn private_rsa(key: &RsaSigningKey) -> Self {
        Self {
            public_key_use: "enc".to_owned(),
            d: Some(key.private_exponent()),
            ..Self::public_rsa(key)
        }
    }

    /// Public signing projection of an EC key.
    pub fn public_ec(key: &EcdsaSigningKey) -> CryptoResult<Self> {
        let (x, y) = key.public_coordinates()?;
        Ok(Self {
            kty: "EC".to_owned(),
            kid: key.key_id().to_owned(),
            public_key_use: "sig".to_owned(),
            alg: key.algorithm().jwa_name().to_owned(),
            n: None,
            e: None,
            d: None,
            crv: Some(key.curve_name().to_owned()),
            x: Some(x),
            y: Some(y),
        })
    }

    /// Private projection of an EC key, including the private scalar.
    pub fn private_ec(key: &EcdsaSigningKey) -> CryptoResult<Self> {
        Ok(Self {
            public_key_use: "enc".to_owned(),
            d: Some(key.private_scalar()),
            ..Self::public_ec(key)?
        })
    }
}

/// An ordered set of JSON Web Keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// The keys, pool order preserved.
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Wraps a list of keys.
    #[must_use]
    pub fn new(keys: Vec<JsonWebKey>) -> Self {
        Self { keys }
    }

    /// Finds a key by identifier.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
