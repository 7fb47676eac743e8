//! The provider composition: configuration, key service, token store, and
//! the deployment-supplied collaborators wired into end-to-end operations.
//!
//! Construction is plain and explicit: [`OidcProvider::new`] builds the
//! internal services, the composition root supplies the three collaborator
//! trait objects, and [`initialize`] / [`shutdown`] bracket the lifecycle.
//! There is no registry of instances and nothing happens implicitly.
//!
//! [`initialize`]: OidcProvider::initialize
//! [`shutdown`]: OidcProvider::shutdown

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use oxidc_core::{Authenticator, ClientManager, Config, UserinfoProvider};
use oxidc_crypto::hash::token_hash;
use oxidc_crypto::{next_token, AlgorithmRegistry, CryptoResult, SignatureAlgorithm};
use oxidc_store::{ConsentKey, TokenRecord, TokenResponse, TokenStore};

use crate::authorize::{success_redirect, AuthorizationValidator, RequestContext};
use crate::bearer::BearerValidator;
use crate::discovery::ProviderMetadata;
use crate::error::{BearerErrorKind, ProtocolError, ProtocolErrorKind, ProtocolResult};
use crate::jwks::JsonWebKeySet;
use crate::keys::KeyService;
use crate::request::AuthenticationRequest;

/// Outcome of a successful authorization.
#[derive(Debug, Clone)]
pub struct AuthorizationSuccess {
    /// Where to send the user agent: the registered redirect URI carrying
    /// `code` and, when the client supplied one, `state` — nothing else.
    pub redirect_uri: String,
    /// The single-use authorization code embedded in the URI.
    pub code: String,
}

/// The OpenID Connect provider core.
pub struct OidcProvider {
    config: Config,
    registry: Arc<AlgorithmRegistry>,
    keys: KeyService,
    store: Arc<TokenStore>,
    validator: AuthorizationValidator,
    bearer: BearerValidator,
    authenticator: Arc<dyn Authenticator>,
    userinfo: Arc<dyn UserinfoProvider>,
}

impl OidcProvider {
    /// Wires the provider together from configuration and the three
    /// deployment collaborators. No keys exist until [`initialize`] runs.
    ///
    /// [`initialize`]: OidcProvider::initialize
    #[must_use]
    pub fn new(
        config: Config,
        clients: Arc<dyn ClientManager>,
        authenticator: Arc<dyn Authenticator>,
        userinfo: Arc<dyn UserinfoProvider>,
    ) -> Self {
        let registry = Arc::new(AlgorithmRegistry::bootstrap());
        let store = Arc::new(TokenStore::new());
        let keys = KeyService::new(Arc::clone(&registry));
        let require_secure = config.provider.require_secure_transport;
        let validator = AuthorizationValidator::new(Arc::clone(&clients), require_secure);
        let bearer = BearerValidator::new(clients, Arc::clone(&store), require_secure);
        Self {
            config,
            registry,
            keys,
            store,
            validator,
            bearer,
            authenticator,
            userinfo,
        }
    }

    /// Generates the signing pool and service key. Must succeed before the
    /// provider serves anything; a failure here aborts startup.
    pub fn initialize(&self) -> CryptoResult<()> {
        self.keys.generate_keys(&self.config.keys)
    }

    /// Tears down key material. In-flight tokens become unverifiable.
    pub fn shutdown(&self) {
        self.keys.clear();
        info!("provider shut down");
    }

    /// Authenticates an end user through the deployment's authenticator,
    /// yielding the subject on success.
    #[must_use]
    pub fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        self.authenticator.authenticate(username, password)
    }

    /// Whether `subject` has an unexpired grant for exactly this client and
    /// scope set.
    #[must_use]
    pub fn has_consent(&self, subject: &str, client_id: &str, scopes: &[String]) -> bool {
        self.store
            .get_by_consent(&ConsentKey::new(subject, client_id, scopes))
            .is_some()
    }

    /// Runs a validated authorization for an authenticated subject: mints
    /// the code, the tokens, and the signed id token, stores the record
    /// under every credential, and assembles the success redirect.
    pub fn authorize(
        &self,
        request: &AuthenticationRequest,
        ctx: &RequestContext,
        subject: &str,
    ) -> ProtocolResult<AuthorizationSuccess> {
        self.validator.validate(request, ctx)?;

        if !request.response_types().contains("code") {
            return Err(ProtocolError::redirect(
                ProtocolErrorKind::UnsupportedResponseType,
                "only the authorization code flow is supported",
                request.state().map(str::to_owned),
            ));
        }

        let algorithm = SignatureAlgorithm::from_jwa(&self.config.keys.signature_algorithm)?;
        let scopes: Vec<String> = request.scopes().iter().cloned().collect();
        let code = next_token();
        let access_token = next_token();
        let refresh_token = next_token();
        let now = Utc::now();

        let mut claims = serde_json::json!({
            "iss": self.config.provider.issuer,
            "sub": subject,
            "aud": request.client_id(),
            "iat": now.timestamp(),
            "exp": (now + Duration::seconds(i64::from(self.config.tokens.id_token_lifetime_secs)))
                .timestamp(),
            "at_hash": token_hash(algorithm, &access_token),
            "c_hash": token_hash(algorithm, &code),
        });
        if let Some(nonce) = request.nonce() {
            claims["nonce"] = serde_json::json!(nonce);
        }

        let id_token = self.keys.sign(&claims)?;
        let response = TokenResponse {
            access_token,
            refresh_token: Some(refresh_token),
            id_token: Some(id_token),
            token_type: "Bearer".to_owned(),
            expires_in: self.config.tokens.access_token_lifetime_secs,
            scope: Some(scopes.join(" ")),
        };
        let record = TokenRecord::new(
            response,
            claims,
            now,
            Duration::seconds(i64::from(self.config.tokens.access_token_lifetime_secs)),
        );
        let consent = ConsentKey::new(subject, request.client_id(), &scopes);
        self.store.store(record, Some(code.clone()), Some(consent));

        info!(
            client_id = request.client_id(),
            subject, "authorization granted"
        );
        Ok(AuthorizationSuccess {
            redirect_uri: success_redirect(request.redirect_uri(), &code, request.state()),
            code,
        })
    }

    /// Exchanges an authorization code for its token response. The client
    /// must authenticate, the code must belong to it, be inside its
    /// lifetime, and never have been exchanged before.
    pub fn redeem_code(
        &self,
        secure_transport: bool,
        authorization: Option<&str>,
        code: &str,
    ) -> ProtocolResult<TokenResponse> {
        let client_id = self
            .bearer
            .validate_client_credentials(secure_transport, authorization)?;

        let record = self.store.get_by_code(code).ok_or_else(|| {
            ProtocolError::direct(
                ProtocolErrorKind::InvalidGrant,
                "authorization code is unknown or expired",
            )
        })?;

        if record.claims().get("aud").and_then(serde_json::Value::as_str)
            != Some(client_id.as_str())
        {
            return Err(ProtocolError::direct(
                ProtocolErrorKind::InvalidGrant,
                "authorization code was issued to another client",
            ));
        }

        let age = Utc::now() - record.issued_at();
        if age > Duration::seconds(i64::from(self.config.tokens.code_lifetime_secs)) {
            return Err(ProtocolError::direct(
                ProtocolErrorKind::InvalidGrant,
                "authorization code has expired",
            ));
        }

        // The single atomic check-and-mark; everything above was reads.
        if !self.store.claim_code(code) {
            warn!(client_id, "authorization code replayed");
            return Err(ProtocolError::direct(
                ProtocolErrorKind::InvalidGrant,
                "authorization code has already been used",
            ));
        }

        debug!(client_id, "authorization code exchanged");
        Ok(record.response().clone())
    }

    /// Answers a userinfo call for a bearer access token.
    pub fn userinfo(
        &self,
        secure_transport: bool,
        authorization: Option<&str>,
    ) -> ProtocolResult<serde_json::Value> {
        let record = self
            .bearer
            .validate_access_token(secure_transport, authorization)?;
        let subject = record.subject().ok_or_else(|| {
            ProtocolError::direct(
                ProtocolErrorKind::ServerError,
                "stored record carries no subject",
            )
        })?;

        let scopes = record.response().scopes();
        let mut claims = self.userinfo.userinfo(subject, &scopes).ok_or_else(|| {
            ProtocolError::challenge(BearerErrorKind::InvalidToken, "subject is no longer known")
        })?;

        // The sub member is mandatory in a userinfo response.
        if claims.get("sub").is_none() {
            if let serde_json::Value::Object(map) = &mut claims {
                map.insert("sub".to_owned(), serde_json::json!(subject));
            }
        }
        Ok(claims)
    }

    /// Revokes an access token after client authentication. Returns whether
    /// the token was live; revoking an unknown token is not an error.
    pub fn revoke_access_token(
        &self,
        secure_transport: bool,
        authorization: Option<&str>,
        token: &str,
    ) -> ProtocolResult<bool> {
        self.bearer
            .validate_client_credentials(secure_transport, authorization)?;
        Ok(self.store.remove_access_token(token))
    }

    /// Revokes a refresh token after client authentication.
    pub fn revoke_refresh_token(
        &self,
        secure_transport: bool,
        authorization: Option<&str>,
        token: &str,
    ) -> ProtocolResult<bool> {
        self.bearer
            .validate_client_credentials(secure_transport, authorization)?;
        Ok(self.store.remove_refresh_token(token))
    }

    /// The discovery document for this configuration and catalog.
    #[must_use]
    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::from_config(&self.config, &self.registry)
    }

    /// The public signing-key set.
    #[must_use]
    pub fn jwks(&self) -> JsonWebKeySet {
        self.keys.jwks()
    }

    /// The provider's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The key service, for callers that verify or seal directly.
    #[must_use]
    pub fn keys(&self) -> &KeyService {
        &self.keys
    }

    /// The token store.
    #[must_use]
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// The availability-probed algorithm catalog.
    #[must_use]
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }
}
