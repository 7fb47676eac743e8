//! Ordered authorization-request validation and redirect assembly.
//!
//! Validation is fail-fast and the order is load-bearing: the redirect
//! target is vetted first, and only failures after that point may be
//! delivered as error redirects. A request with an unregistered
//! `redirect_uri` is answered directly, whatever else is wrong with it.

use std::sync::Arc;

use tracing::debug;

use oxidc_core::ClientManager;

use crate::error::{ProtocolError, ProtocolErrorKind, ProtocolResult};
use crate::request::{AuthenticationRequest, Prompt};

/// Transport and session facts the validator needs about the incoming
/// request; supplied by the embedding layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    /// Whether the request arrived over a secure channel.
    pub secure_transport: bool,
    /// Whether the caller already holds an authenticated session.
    pub authenticated: bool,
}

/// The ordered validation pipeline over parsed authentication requests.
pub struct AuthorizationValidator {
    clients: Arc<dyn ClientManager>,
    require_secure_transport: bool,
}

impl AuthorizationValidator {
    /// Creates a validator backed by the deployment's client registry.
    /// Disabling `require_secure_transport` waives rule 2 only; deployments
    /// terminating TLS elsewhere use it.
    #[must_use]
    pub fn new(clients: Arc<dyn ClientManager>, require_secure_transport: bool) -> Self {
        Self {
            clients,
            require_secure_transport,
        }
    }

    /// Applies the rules in order; the first failure wins.
    pub fn validate(
        &self,
        request: &AuthenticationRequest,
        ctx: &RequestContext,
    ) -> ProtocolResult<()> {
        // Nothing may be redirected before the target itself is vetted.
        if !self
            .clients
            .is_redirect_uri_registered(request.client_id(), request.redirect_uri())
        {
            debug!(
                client_id = request.client_id(),
                redirect_uri = request.redirect_uri(),
                "rejecting unregistered redirect URI"
            );
            return Err(ProtocolError::RedirectTargetInvalid {
                client_id: request.client_id().to_owned(),
            });
        }

        if self.require_secure_transport && !ctx.secure_transport {
            return Err(self.reject(
                request,
                ProtocolErrorKind::InvalidRequest,
                "secure transport required",
            ));
        }

        if !request.has_scope("openid") {
            return Err(self.reject(
                request,
                ProtocolErrorKind::InvalidRequest,
                "scope must include openid",
            ));
        }

        if request.has_prompt(Prompt::None) && request.prompts().len() > 1 {
            return Err(self.reject(
                request,
                ProtocolErrorKind::InvalidRequest,
                "prompt none must not be combined with other prompts",
            ));
        }

        if request.has_prompt(Prompt::None) && !ctx.authenticated {
            return Err(self.reject(
                request,
                ProtocolErrorKind::LoginRequired,
                "no authenticated session and prompt none forbids interaction",
            ));
        }

        Ok(())
    }

    fn reject(
        &self,
        request: &AuthenticationRequest,
        kind: ProtocolErrorKind,
        description: &str,
    ) -> ProtocolError {
        debug!(
            client_id = request.client_id(),
            code = kind.code(),
            "rejecting authorization request"
        );
        ProtocolError::redirect(kind, description, request.state().map(str::to_owned))
    }
}

/// Appends query parameters to a redirect target, URL-encoding values and
/// extending an existing query string when one is present.
#[must_use]
pub fn append_query(uri: &str, params: &[(&str, &str)]) -> String {
    let mut assembled = String::from(uri);
    let mut separator = if uri.contains('?') { '&' } else { '?' };
    for (name, value) in params {
        assembled.push(separator);
        assembled.push_str(name);
        assembled.push('=');
        assembled.push_str(&urlencoding::encode(value));
        separator = '&';
    }
    assembled
}

/// The success redirect: `code`, plus `state` when the client supplied one.
/// Nothing else — tokens never travel on the front channel in the code
/// flow.
#[must_use]
pub fn success_redirect(redirect_uri: &str, code: &str, state: Option<&str>) -> String {
    let mut params = vec![("code", code)];
    if let Some(state) = state {
        params.push(("state", state));
    }
    append_query(redirect_uri, &params)
}

/// The error redirect: `error`, optional `error_description`, and `state`
/// when the client supplied one.
#[must_use]
pub fn error_redirect(
    redirect_uri: &str,
    error_code: &str,
    description: &str,
    state: Option<&str>,
) -> String {
    let mut params = vec![("error", error_code)];
    if !description.is_empty() {
        params.push(("error_description", description));
    }
    if let Some(state) = state {
        params.push(("state", state));
    }
    append_query(redirect_uri, &params)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubClients;

    impl ClientManager for StubClients {
        fn is_redirect_uri_registered(&self, client_id: &str, redirect_uri: &str) -> bool {
            client_id == "client-1" && redirect_uri == "https://app.example/cb"
        }

        fn authenticate_client(&self, _client_id: &str, _client_secret: &str) -> bool {
            false
        }
    }

    fn validator() -> AuthorizationValidator {
        AuthorizationValidator::new(Arc::new(StubClients), true)
    }

    fn request(params: &[(&str, &str)]) -> AuthenticationRequest {
        let mut all = vec![
            ("client_id", "client-1"),
            ("redirect_uri", "https://app.example/cb"),
        ];
        all.extend_from_slice(params);
        AuthenticationRequest::parse(all).unwrap()
    }

    fn secure() -> RequestContext {
        RequestContext {
            secure_transport: true,
            authenticated: false,
        }
    }

    #[test]
    fn valid_request_passes() {
        let request = request(&[("scope", "openid profile"), ("state", "xyz")]);
        assert!(validator().validate(&request, &secure()).is_ok());
    }

    #[test]
    fn unregistered_redirect_uri_is_never_redirected() {
        let request = AuthenticationRequest::parse([
            ("client_id", "client-1"),
            ("redirect_uri", "https://evil.example/cb"),
            ("scope", "openid"),
        ])
        .unwrap();
        let err = validator().validate(&request, &secure()).unwrap_err();
        assert!(matches!(err, ProtocolError::RedirectTargetInvalid { .. }));
    }

    #[test]
    fn redirect_vetting_precedes_every_other_rule() {
        // Fails rule 1 and rule 3 at once; rule 1 must win.
        let request = AuthenticationRequest::parse([
            ("client_id", "client-1"),
            ("redirect_uri", "https://evil.example/cb"),
            ("scope", "profile"),
        ])
        .unwrap();
        let err = validator().validate(&request, &secure()).unwrap_err();
        assert!(matches!(err, ProtocolError::RedirectTargetInvalid { .. }));
    }

    #[test]
    fn insecure_transport_is_redirected_as_invalid_request() {
        let request = request(&[("scope", "openid"), ("state", "xyz")]);
        let ctx = RequestContext {
            secure_transport: false,
            authenticated: false,
        };
        match validator().validate(&request, &ctx).unwrap_err() {
            ProtocolError::Redirect { kind, state, .. } => {
                assert_eq!(kind, ProtocolErrorKind::InvalidRequest);
                assert_eq!(state.as_deref(), Some("xyz"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn waived_transport_requirement_admits_insecure_requests() {
        let validator = AuthorizationValidator::new(Arc::new(StubClients), false);
        let request = request(&[("scope", "openid")]);
        let ctx = RequestContext {
            secure_transport: false,
            authenticated: false,
        };
        assert!(validator.validate(&request, &ctx).is_ok());
    }

    #[test]
    fn scope_without_openid_is_invalid_request() {
        let request = request(&[("scope", "profile email")]);
        match validator().validate(&request, &secure()).unwrap_err() {
            ProtocolError::Redirect { kind, .. } => {
                assert_eq!(kind, ProtocolErrorKind::InvalidRequest);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prompt_none_must_be_exclusive() {
        let request = request(&[("scope", "openid"), ("prompt", "none login")]);
        match validator().validate(&request, &secure()).unwrap_err() {
            ProtocolError::Redirect { kind, .. } => {
                assert_eq!(kind, ProtocolErrorKind::InvalidRequest);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prompt_none_without_session_is_login_required() {
        let request = request(&[("scope", "openid"), ("prompt", "none"), ("state", "s1")]);
        match validator().validate(&request, &secure()).unwrap_err() {
            ProtocolError::Redirect { kind, state, .. } => {
                assert_eq!(kind, ProtocolErrorKind::LoginRequired);
                assert_eq!(state.as_deref(), Some("s1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prompt_none_with_session_passes() {
        let request = request(&[("scope", "openid"), ("prompt", "none")]);
        let ctx = RequestContext {
            secure_transport: true,
            authenticated: true,
        };
        assert!(validator().validate(&request, &ctx).is_ok());
    }

    #[test]
    fn append_query_respects_existing_query_strings() {
        assert_eq!(
            append_query("https://app.example/cb", &[("a", "1"), ("b", "2")]),
            "https://app.example/cb?a=1&b=2"
        );
        assert_eq!(
            append_query("https://app.example/cb?tenant=t1", &[("a", "1")]),
            "https://app.example/cb?tenant=t1&a=1"
        );
    }

    #[test]
    fn query_values_are_url_encoded() {
        let uri = append_query("https://app.example/cb", &[("state", "a b&c=d")]);
        assert_eq!(uri, "https://app.example/cb?state=a%20b%26c%3Dd");
    }

    #[test]
    fn success_redirect_carries_only_code_and_state() {
        let uri = success_redirect("https://app.example/cb", "the-code", Some("xyz"));
        assert_eq!(uri, "https://app.example/cb?code=the-code&state=xyz");

        let uri = success_redirect("https://app.example/cb", "the-code", None);
        assert_eq!(uri, "https://app.example/cb?code=the-code");
    }

    #[test]
    fn error_redirect_carries_code_description_and_state() {
        let uri = error_redirect(
            "https://app.example/cb",
            "login_required",
            "no session",
            Some("xyz"),
        );
        assert_eq!(
            uri,
            "https://app.example/cb?error=login_required&error_description=no%20session&state=xyz"
        );
    }
}
