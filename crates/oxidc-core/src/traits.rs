//! Collaborator contracts supplied at composition time.
//!
//! These cover everything the protocol engine delegates outward: client
//! registration data, end-user authentication, and claim resolution. The
//! core ships no implementations; the embedding application (or a test
//! harness) constructs its own and passes them in.

/// Registered-client lookups and client authentication.
pub trait ClientManager: Send + Sync {
    /// Whether `redirect_uri` is registered for `client_id`.
    ///
    /// The authorization validator consults this before anything is ever
    /// sent to the URI; an unregistered target fails the request directly.
    fn is_redirect_uri_registered(&self, client_id: &str, redirect_uri: &str) -> bool;

    /// Authenticates a client by its shared secret.
    fn authenticate_client(&self, client_id: &str, client_secret: &str) -> bool;
}

/// End-user authentication.
pub trait Authenticator: Send + Sync {
    /// Verifies the credentials and returns the subject identifier on
    /// success.
    fn authenticate(&self, username: &str, password: &str) -> Option<String>;
}

/// Claim resolution for the userinfo surface.
pub trait UserinfoProvider: Send + Sync {
    /// Returns the claims released for `subject` under the granted scopes,
    /// or `None` when the subject is unknown.
    fn userinfo(&self, subject: &str, scopes: &[String]) -> Option<serde_json::Value>;
}
