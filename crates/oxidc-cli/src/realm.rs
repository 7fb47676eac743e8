//! The in-memory demo realm.
//!
//! One confidential client and two end users, enough to exercise every
//! surface of the provider. The client secret is minted fresh on every run;
//! nothing here persists.

use std::collections::HashMap;

use serde_json::json;
use subtle::ConstantTimeEq;

use oxidc_core::{Authenticator, ClientManager, UserinfoProvider};
use oxidc_crypto::random::random_alphanumeric;

/// Redirect URI registered for the demo client.
pub const DEMO_REDIRECT_URI: &str = "https://app.example/callback";

struct DemoUser {
    password: String,
    subject: String,
    name: String,
    email: String,
}

/// A fixed client and user population implementing all three collaborator
/// contracts, so one `Arc` serves the whole composition.
pub struct DemoRealm {
    client_id: String,
    client_secret: String,
    users: HashMap<String, DemoUser>,
}

impl DemoRealm {
    /// Builds the realm with a freshly minted client secret.
    #[must_use]
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(
            "alice".to_owned(),
            DemoUser {
                password: "wonderland".to_owned(),
                subject: "user-alice".to_owned(),
                name: "Alice Liddell".to_owned(),
                email: "alice@app.example".to_owned(),
            },
        );
        users.insert(
            "bob".to_owned(),
            DemoUser {
                password: "builder".to_owned(),
                subject: "user-bob".to_owned(),
                name: "Bob Gorski".to_owned(),
                email: "bob@app.example".to_owned(),
            },
        );
        Self {
            client_id: "demo-app".to_owned(),
            client_secret: random_alphanumeric(32),
            users,
        }
    }

    /// The registered client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The secret minted for this run.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl Default for DemoRealm {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientManager for DemoRealm {
    fn is_redirect_uri_registered(&self, client_id: &str, redirect_uri: &str) -> bool {
        client_id == self.client_id && redirect_uri == DEMO_REDIRECT_URI
    }

    fn authenticate_client(&self, client_id: &str, client_secret: &str) -> bool {
        client_id == self.client_id
            && bool::from(
                client_secret
                    .as_bytes()
                    .ct_eq(self.client_secret.as_bytes()),
            )
    }
}

impl Authenticator for DemoRealm {
    fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        let user = self.users.get(username)?;
        let matches = bool::from(password.as_bytes().ct_eq(user.password.as_bytes()));
        matches.then(|| user.subject.clone())
    }
}

impl UserinfoProvider for DemoRealm {
    fn userinfo(&self, subject: &str, scopes: &[String]) -> Option<serde_json::Value> {
        let user = self.users.values().find(|user| user.subject == subject)?;
        let mut claims = json!({ "sub": subject });
        if scopes.iter().any(|scope| scope == "profile") {
            claims["name"] = json!(user.name);
        }
        if scopes.iter().any(|scope| scope == "email") {
            claims["email"] = json!(user.email);
        }
        Some(claims)
    }
}
