//! Bearer-token and client-credential validation.
//!
//! Both validators insist on secure transport first; that failure is a
//! 400-class [`ProtocolError::InsecureTransport`], deliberately distinct
//! from the 401 challenges. Everything after that follows the challenge
//! discipline: a missing header earns a bare `Bearer` challenge, anything
//! else names an error code the client can act on.
//!
//! Client credentials ride in the same Bearer payload as base64url
//! `clientId:clientSecret`, split on the first colon, so secrets may
//! contain colons but client ids may not.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tracing::debug;

use oxidc_core::ClientManager;
use oxidc_store::{TokenRecord, TokenStore};

use crate::error::{BearerErrorKind, ProtocolError, ProtocolResult};

/// Validator for bearer-authenticated calls.
pub struct BearerValidator {
    clients: Arc<dyn ClientManager>,
    store: Arc<TokenStore>,
    require_secure_transport: bool,
}

impl BearerValidator {
    /// Creates a validator over the deployment's client registry and the
    /// token store. A waived transport requirement skips the
    /// [`ProtocolError::InsecureTransport`] check on both surfaces.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientManager>,
        store: Arc<TokenStore>,
        require_secure_transport: bool,
    ) -> Self {
        Self {
            clients,
            store,
            require_secure_transport,
        }
    }

    /// Resolves a bearer access token to its stored record.
    pub fn validate_access_token(
        &self,
        secure_transport: bool,
        authorization: Option<&str>,
    ) -> ProtocolResult<Arc<TokenRecord>> {
        if self.require_secure_transport && !secure_transport {
            return Err(ProtocolError::InsecureTransport);
        }
        let token = bearer_payload(authorization)?;
        self.store.get_by_access_token(token).ok_or_else(|| {
            ProtocolError::challenge(
                BearerErrorKind::InvalidToken,
                "access token is unknown, expired, or revoked",
            )
        })
    }

    /// Authenticates a client from its Bearer-carried credentials and
    /// returns the client id.
    pub fn validate_client_credentials(
        &self,
        secure_transport: bool,
        authorization: Option<&str>,
    ) -> ProtocolResult<String> {
        if self.require_secure_transport && !secure_transport {
            return Err(ProtocolError::InsecureTransport);
        }
        let payload = bearer_payload(authorization)?;
        let decoded = URL_SAFE_NO_PAD.decode(payload).map_err(|_| {
            ProtocolError::challenge(
                BearerErrorKind::InvalidRequest,
                "credentials are not valid base64url",
            )
        })?;
        let decoded = String::from_utf8(decoded).map_err(|_| {
            ProtocolError::challenge(
                BearerErrorKind::InvalidRequest,
                "credentials are not valid UTF-8",
            )
        })?;
        let (client_id, client_secret) = decoded.split_once(':').ok_or_else(|| {
            ProtocolError::challenge(
                BearerErrorKind::InvalidRequest,
                "credentials must be clientId:clientSecret",
            )
        })?;

        if !self.clients.authenticate_client(client_id, client_secret) {
            debug!(client_id, "client authentication failed");
            return Err(ProtocolError::challenge(
                BearerErrorKind::InvalidToken,
                "client authentication failed",
            ));
        }
        Ok(client_id.to_owned())
    }
}

/// Strips the `Bearer` scheme off an `Authorization` header value.
fn bearer_payload(authorization: Option<&str>) -> ProtocolResult<&str> {
    let header = authorization
        .ok_or_else(|| ProtocolError::challenge(BearerErrorKind::InvalidRequest, ""))?;
    let (scheme, value) = header.split_once(' ').ok_or_else(|| {
        ProtocolError::challenge(
            BearerErrorKind::InvalidRequest,
            "malformed Authorization header",
        )
    })?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ProtocolError::challenge(
            BearerErrorKind::InvalidRequest,
            "unsupported authorization scheme",
        ));
    }
    Ok(value.trim())
}
