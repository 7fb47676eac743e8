//! Issued-token material and the consent identity it was granted under.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token-endpoint success payload for an authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer credential for resource access.
    pub access_token: String,
    /// Opaque credential for obtaining fresh access tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Signed identity assertion (compact JWS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Always `Bearer` for this provider.
    pub token_type: String,
    /// Access-token lifetime in seconds.
    pub expires_in: u32,
    /// Space-delimited granted scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// The granted scopes as individual values.
    #[must_use]
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }
}

/// Identity of a consent grant: who approved what for which client.
///
/// Scopes are sorted and deduplicated on construction, so two keys built
/// from the same grant compare equal regardless of the order the scopes
/// arrived in on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsentKey {
    subject: String,
    client_id: String,
    scopes: Vec<String>,
}

impl ConsentKey {
    /// Builds the canonical key for a grant.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        client_id: impl Into<String>,
        scopes: &[String],
    ) -> Self {
        let mut scopes = scopes.to_vec();
        scopes.sort();
        scopes.dedup();
        Self {
            subject: subject.into(),
            client_id: client_id.into(),
            scopes,
        }
    }

    /// The authenticated end-user the grant belongs to.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The client the grant was made for.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The canonicalized scope set.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Everything retained about one successful authorization.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    response: TokenResponse,
    claims: serde_json::Value,
    issued_at: DateTime<Utc>,
    lifetime: Duration,
}

impl TokenRecord {
    /// Creates a record issued at the given instant with the given lifetime.
    #[must_use]
    pub fn new(
        response: TokenResponse,
        claims: serde_json::Value,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            response,
            claims,
            issued_at,
            lifetime,
        }
    }

    /// The token-endpoint payload this record was minted with.
    #[must_use]
    pub fn response(&self) -> &TokenResponse {
        &self.response
    }

    /// The full claim set carried by the id token.
    #[must_use]
    pub fn claims(&self) -> &serde_json::Value {
        &self.claims
    }

    /// The subject claim, when present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(serde_json::Value::as_str)
    }

    /// When the record was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// The instant the record stops being valid.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.lifetime
    }

    /// Whether the record has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}
