//! Per-request error taxonomy.
//!
//! Fatal crypto failures stay in [`CryptoError`] and abort whatever they
//! interrupt. Everything here is recoverable at the request boundary: each
//! variant says how it reaches the client — as query parameters on a vetted
//! redirect URI, as a JSON error body, or as a `WWW-Authenticate`
//! challenge. The one deliberate asymmetry is [`RedirectTargetInvalid`]:
//! when the redirect URI itself failed validation, the caller is told
//! directly and no redirect is ever issued.
//!
//! [`RedirectTargetInvalid`]: ProtocolError::RedirectTargetInvalid

use oxidc_crypto::CryptoError;
use thiserror::Error;

/// Convenience alias for protocol-layer results.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Standard OAuth 2.0 / OpenID Connect error codes the provider emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// Structurally or semantically invalid request.
    InvalidRequest,
    /// The client may not use this grant.
    UnauthorizedClient,
    /// The end-user or provider denied the request.
    AccessDenied,
    /// Unsupported `response_type` value.
    UnsupportedResponseType,
    /// Invalid or unknown scope value.
    InvalidScope,
    /// Internal failure surfaced in protocol form.
    ServerError,
    /// Provider temporarily unable to serve the request.
    TemporarilyUnavailable,
    /// Interaction needed but `prompt=none` forbade it.
    InteractionRequired,
    /// Authentication needed but `prompt=none` forbade it.
    LoginRequired,
    /// Consent needed but `prompt=none` forbade it.
    ConsentRequired,
    /// Invalid, expired, or already-used grant credential.
    InvalidGrant,
    /// Client authentication failed.
    InvalidClient,
}

impl ProtocolErrorKind {
    /// The wire form of the code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
            Self::InteractionRequired => "interaction_required",
            Self::LoginRequired => "login_required",
            Self::ConsentRequired => "consent_required",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidClient => "invalid_client",
        }
    }
}

/// Error codes carried in a `WWW-Authenticate: Bearer` challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerErrorKind {
    /// The request is missing a parameter or is otherwise malformed.
    InvalidRequest,
    /// The presented token is expired, revoked, or unknown.
    InvalidToken,
    /// The token does not grant the scope this resource requires.
    InsufficientScope,
}

impl BearerErrorKind {
    /// The wire form of the code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidToken => "invalid_token",
            Self::InsufficientScope => "insufficient_scope",
        }
    }
}

/// A recoverable per-request failure, tagged with its delivery route.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Validation failed after the redirect target was vetted; delivered to
    /// the client as `error` / `error_description` / `state` query
    /// parameters on the registered redirect URI.
    #[error("{}: {description}", .kind.code())]
    Redirect {
        /// Wire error code.
        kind: ProtocolErrorKind,
        /// Human-readable detail for the `error_description` parameter.
        description: String,
        /// Opaque client state echoed back verbatim when present.
        state: Option<String>,
    },

    /// Failure answered in place with a JSON error body (token endpoint,
    /// revocation, userinfo parameter problems).
    #[error("{}: {description}", .kind.code())]
    Direct {
        /// Wire error code.
        kind: ProtocolErrorKind,
        /// Human-readable detail for the `error_description` member.
        description: String,
    },

    /// The redirect URI is not registered for the client. Never redirected:
    /// sending an error to an unvetted target would hand the authorization
    /// response to an attacker-chosen location.
    #[error("redirect URI not registered for client {client_id}")]
    RedirectTargetInvalid {
        /// The client that presented the unregistered URI.
        client_id: String,
    },

    /// A required request parameter is absent.
    #[error("missing required parameter {name}")]
    MissingParameter {
        /// Parameter name.
        name: &'static str,
    },

    /// A request parameter is present but unparseable.
    #[error("malformed parameter {name}")]
    MalformedParameter {
        /// Parameter name.
        name: &'static str,
    },

    /// Bearer authentication failed; answered 401 with a challenge.
    #[error("bearer authentication failed: {description}")]
    BearerChallenge {
        /// Challenge error code.
        error: BearerErrorKind,
        /// Human-readable detail; empty for a bare challenge.
        description: String,
    },

    /// The request arrived over an insecure transport.
    #[error("secure transport required")]
    InsecureTransport,

    /// A crypto primitive failed mid-request.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ProtocolError {
    /// Builds a redirect-delivered error.
    #[must_use]
    pub fn redirect(
        kind: ProtocolErrorKind,
        description: impl Into<String>,
        state: Option<String>,
    ) -> Self {
        Self::Redirect {
            kind,
            description: description.into(),
            state,
        }
    }

    /// Builds a directly-answered error.
    #[must_use]
    pub fn direct(kind: ProtocolErrorKind, description: impl Into<String>) -> Self {
        Self::Direct {
            kind,
            description: description.into(),
        }
    }

    /// Builds a 401 challenge for a bad or missing bearer token.
    #[must_use]
    pub fn challenge(error: BearerErrorKind, description: impl Into<String>) -> Self {
        Self::BearerChallenge {
            error,
            description: description.into(),
        }
    }

    /// The `error` code this failure puts on the wire.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Redirect { kind, .. } | Self::Direct { kind, .. } => kind.code(),
            Self::RedirectTargetInvalid { .. }
            | Self::MissingParameter { .. }
            | Self::MalformedParameter { .. }
            | Self::InsecureTransport => ProtocolErrorKind::InvalidRequest.code(),
            Self::BearerChallenge { error, .. } => error.code(),
            Self::Crypto(_) => ProtocolErrorKind::ServerError.code(),
        }
    }

    /// The HTTP status an embedding layer should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Redirect { .. } => 302,
            Self::Direct { .. }
            | Self::RedirectTargetInvalid { .. }
            | Self::MissingParameter { .. }
            | Self::MalformedParameter { .. }
            | Self::InsecureTransport => 400,
            Self::BearerChallenge { .. } => 401,
            Self::Crypto(_) => 500,
        }
    }

    /// The `WWW-Authenticate` header value, for challenge-class failures.
    #[must_use]
    pub fn www_authenticate(&self) -> Option<String> {
        match self {
            Self::BearerChallenge { error, description } => {
                if description.is_empty() {
                    Some("Bearer".to_string())
                } else {
                    Some(format!(
                        "Bearer error=\"{}\", error_description=\"{}\"",
                        error.code(),
                        description
                    ))
                }
            }
            _ => None,
        }
    }

    /// The JSON body for direct (non-redirect) error responses.
    #[must_use]
    pub fn to_error_body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error_code(),
            "error_description": self.description_text(),
        })
    }

    fn description_text(&self) -> String {
        match self {
            Self::Redirect { description, .. }
            | Self::Direct { description, .. }
            | Self::BearerChallenge { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }
}
