//! Command implementations.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use oxidc_core::Config;
use oxidc_crypto::next_token;
use oxidc_protocol::{AuthenticationRequest, OidcProvider, RequestContext};

use crate::cli::FlowArgs;
use crate::output;
use crate::realm::{DemoRealm, DEMO_REDIRECT_URI};

fn compose(config: Config) -> (Arc<DemoRealm>, OidcProvider) {
    let realm = Arc::new(DemoRealm::new());
    let provider = OidcProvider::new(config, realm.clone(), realm.clone(), realm.clone());
    (realm, provider)
}

/// `Authorization` header value carrying the demo client's credentials.
fn client_credentials(client_id: &str, client_secret: &str) -> String {
    format!(
        "Bearer {}",
        URL_SAFE_NO_PAD.encode(format!("{client_id}:{client_secret}"))
    )
}

/// `Authorization` header value carrying a bearer access token.
fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Prints the discovery metadata for the active configuration.
pub fn run_metadata(config: Config) -> anyhow::Result<()> {
    let (_realm, provider) = compose(config);
    output::json(&provider.metadata())
}

/// Generates a signing pool and prints one of its key sets.
pub fn run_jwks(config: Config, private: bool) -> anyhow::Result<()> {
    let (_realm, provider) = compose(config);
    provider.initialize()?;
    if private {
        output::json(&provider.keys().private_jwks())
    } else {
        output::json(&provider.jwks())
    }
}

/// Signs a claims object with a pool key and verifies the result.
pub fn run_sign(config: Config, claims: &str) -> anyhow::Result<()> {
    let claims: serde_json::Value =
        serde_json::from_str(claims).context("claims must be valid JSON")?;
    let (_realm, provider) = compose(config);
    provider.initialize()?;

    let compact = provider.keys().sign(&claims)?;
    println!("{compact}");
    let verified = provider.keys().verify(&compact)?;
    output::success("signature verifies against the pool");
    output::json(&verified)
}

/// Walks the whole authorization-code flow against the demo realm.
pub fn run_flow(config: Config, args: &FlowArgs) -> anyhow::Result<()> {
    let (realm, provider) = compose(config);

    output::step("1. key pool");
    provider.initialize()?;
    output::success(&format!("{} signing keys live", provider.jwks().len()));

    output::step("2. end-user authentication");
    let subject = provider
        .authenticate(&args.username, &args.password)
        .ok_or_else(|| anyhow!("authentication failed for {}", args.username))?;
    output::success(&format!("{} -> {subject}", args.username));

    output::step("3. authorization");
    let state = next_token();
    let nonce = next_token();
    let request = AuthenticationRequest::parse([
        ("client_id", realm.client_id()),
        ("redirect_uri", DEMO_REDIRECT_URI),
        ("response_type", "code"),
        ("scope", args.scope.as_str()),
        ("state", state.as_str()),
        ("nonce", nonce.as_str()),
    ])?;
    let ctx = RequestContext {
        secure_transport: true,
        authenticated: true,
    };
    let granted = provider.authorize(&request, &ctx, &subject)?;
    output::success("authorization granted");
    output::info(&format!("redirect: {}", granted.redirect_uri));

    output::step("4. code redemption");
    let credentials = client_credentials(realm.client_id(), realm.client_secret());
    let response = provider.redeem_code(true, Some(&credentials), &granted.code)?;
    output::json(&response)?;

    output::step("5. id-token verification");
    let id_token = response
        .id_token
        .as_deref()
        .ok_or_else(|| anyhow!("token response carries no id token"))?;
    let claims = provider.keys().verify(id_token)?;
    output::success("id token verifies against the published JWKS");
    output::json(&claims)?;

    output::step("6. userinfo");
    let info = provider.userinfo(true, Some(&bearer(&response.access_token)))?;
    output::json(&info)?;

    output::step("7. code replay");
    match provider.redeem_code(true, Some(&credentials), &granted.code) {
        Err(err) => output::success(&format!("replay rejected: {err}")),
        Ok(_) => bail!("authorization code was redeemable twice"),
    }

    output::step("8. revocation");
    provider.revoke_access_token(true, Some(&credentials), &response.access_token)?;
    match provider.userinfo(true, Some(&bearer(&response.access_token))) {
        Err(err) => {
            output::success("revoked access token no longer accepted");
            if let Some(challenge) = err.www_authenticate() {
                output::info(&format!("challenge: {challenge}"));
            }
        }
        Ok(_) => bail!("revoked access token still accepted"),
    }

    Ok(())
}
