//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::json;
use subtle::ConstantTimeEq;

use oxidc_core::{Authenticator, ClientManager, Config, UserinfoProvider};
use oxidc_protocol::OidcProvider;

pub const DEMO_CLIENT: &str = "client-1";
pub const DEMO_SECRET: &str = "s3cr3t";
pub const DEMO_REDIRECT: &str = "https://app.example/cb";
pub const OTHER_CLIENT: &str = "client-2";
pub const OTHER_SECRET: &str = "0th3r";
pub const OTHER_REDIRECT: &str = "https://other.example/cb";

struct RegisteredClient {
    secret: String,
    redirect_uris: Vec<String>,
}

/// Client registry backed by a map, secrets compared in constant time.
pub struct MemoryClients {
    clients: HashMap<String, RegisteredClient>,
}

impl MemoryClients {
    pub fn demo() -> Self {
        let mut clients = HashMap::new();
        clients.insert(
            DEMO_CLIENT.to_owned(),
            RegisteredClient {
                secret: DEMO_SECRET.to_owned(),
                redirect_uris: vec![DEMO_REDIRECT.to_owned()],
            },
        );
        clients.insert(
            OTHER_CLIENT.to_owned(),
            RegisteredClient {
                secret: OTHER_SECRET.to_owned(),
                redirect_uris: vec![OTHER_REDIRECT.to_owned()],
            },
        );
        Self { clients }
    }
}

impl ClientManager for MemoryClients {
    fn is_redirect_uri_registered(&self, client_id: &str, redirect_uri: &str) -> bool {
        self.clients
            .get(client_id)
            .is_some_and(|client| client.redirect_uris.iter().any(|uri| uri == redirect_uri))
    }

    fn authenticate_client(&self, client_id: &str, client_secret: &str) -> bool {
        self.clients.get(client_id).is_some_and(|client| {
            client
                .secret
                .as_bytes()
                .ct_eq(client_secret.as_bytes())
                .into()
        })
    }
}

/// Password table mapped to subjects.
pub struct MemoryUsers {
    users: HashMap<String, (String, String)>,
}

impl MemoryUsers {
    pub fn demo() -> Self {
        let mut users = HashMap::new();
        users.insert(
            "alice".to_owned(),
            ("wonderland".to_owned(), "user-alice".to_owned()),
        );
        users.insert(
            "bob".to_owned(),
            ("builder".to_owned(), "user-bob".to_owned()),
        );
        Self { users }
    }
}

impl Authenticator for MemoryUsers {
    fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        self.users.get(username).and_then(|(expected, subject)| {
            let matches: bool = expected.as_bytes().ct_eq(password.as_bytes()).into();
            matches.then(|| subject.clone())
        })
    }
}

/// Fixed claims for the two demo subjects, released per scope.
pub struct MemoryUserinfo;

impl UserinfoProvider for MemoryUserinfo {
    fn userinfo(&self, subject: &str, scopes: &[String]) -> Option<serde_json::Value> {
        let (name, email) = match subject {
            "user-alice" => ("Alice Liddell", "alice@example.com"),
            "user-bob" => ("Bob Gorski", "bob@example.com"),
            _ => return None,
        };
        let mut claims = json!({ "sub": subject });
        if scopes.iter().any(|scope| scope == "profile") {
            claims["name"] = json!(name);
        }
        if scopes.iter().any(|scope| scope == "email") {
            claims["email"] = json!(email);
        }
        Some(claims)
    }
}

/// Small keys so the suite stays fast.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.keys.pool_size = 1;
    config.keys.modulus_bits = 1024;
    config
}

/// An initialized provider over the in-memory collaborators.
pub fn provider() -> OidcProvider {
    let provider = OidcProvider::new(
        test_config(),
        Arc::new(MemoryClients::demo()),
        Arc::new(MemoryUsers::demo()),
        Arc::new(MemoryUserinfo),
    );
    provider.initialize().unwrap();
    provider
}

/// `Authorization` header value carrying client credentials.
pub fn client_credentials(client_id: &str, client_secret: &str) -> String {
    format!(
        "Bearer {}",
        URL_SAFE_NO_PAD.encode(format!("{client_id}:{client_secret}"))
    )
}

/// `Authorization` header value carrying a bearer access token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
