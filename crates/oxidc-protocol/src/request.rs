//! Authentication-request parsing.
//!
//! Query parameters come in as loose string pairs and leave as an immutable
//! [`AuthenticationRequest`]. Fields defined as space-delimited lists
//! (`scope`, `response_type`, `prompt`, `ui_locales`, `acr_values`) are
//! split here; everything else is single-valued. Each recognized parameter
//! may appear at most once, unrecognized parameters are ignored.
//!
//! Parsing only checks shape. Policy (registered redirect targets, scope
//! contents, prompt combinations) belongs to
//! [`AuthorizationValidator`](crate::authorize::AuthorizationValidator).

use std::collections::BTreeSet;

use crate::error::{ProtocolError, ProtocolResult};

/// Values of the `prompt` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prompt {
    /// No interaction permitted at all.
    None,
    /// Force re-authentication.
    Login,
    /// Force a fresh consent decision.
    Consent,
    /// Offer an account chooser.
    SelectAccount,
}

impl Prompt {
    /// Parses a single wire value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "login" => Some(Self::Login),
            "consent" => Some(Self::Consent),
            "select_account" => Some(Self::SelectAccount),
            _ => Option::None,
        }
    }

    /// The wire form of the value.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Login => "login",
            Self::Consent => "consent",
            Self::SelectAccount => "select_account",
        }
    }
}

/// Values of the `display` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Full user-agent page (the default presentation).
    Page,
    /// Popup window.
    Popup,
    /// Touch-oriented interface.
    Touch,
    /// Feature-phone interface.
    Wap,
}

impl DisplayMode {
    /// Parses a single wire value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "page" => Some(Self::Page),
            "popup" => Some(Self::Popup),
            "touch" => Some(Self::Touch),
            "wap" => Some(Self::Wap),
            _ => None,
        }
    }

    /// The wire form of the value.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Popup => "popup",
            Self::Touch => "touch",
            Self::Wap => "wap",
        }
    }
}

/// An immutable, structurally-valid authentication request.
#[derive(Debug, Clone)]
pub struct AuthenticationRequest {
    client_id: String,
    redirect_uri: String,
    response_types: BTreeSet<String>,
    scopes: BTreeSet<String>,
    prompts: BTreeSet<Prompt>,
    ui_locales: Vec<String>,
    acr_values: Vec<String>,
    state: Option<String>,
    nonce: Option<String>,
    display: Option<DisplayMode>,
    max_age: Option<u64>,
    login_hint: Option<String>,
    id_token_hint: Option<String>,
}

impl AuthenticationRequest {
    /// Parses raw query parameters.
    ///
    /// `client_id` and `redirect_uri` are required. A repeated recognized
    /// parameter, an unparseable `max_age`, or an unknown `prompt` /
    /// `display` value is malformed.
    pub fn parse<'a, I>(params: I) -> ProtocolResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut client_id = None;
        let mut redirect_uri = None;
        let mut response_type = None;
        let mut scope = None;
        let mut prompt = None;
        let mut ui_locales = None;
        let mut acr_values = None;
        let mut state = None;
        let mut nonce = None;
        let mut display = None;
        let mut max_age = None;
        let mut login_hint = None;
        let mut id_token_hint = None;

        for (name, value) in params {
            match name {
                "client_id" => put(&mut client_id, "client_id", value)?,
                "redirect_uri" => put(&mut redirect_uri, "redirect_uri", value)?,
                "response_type" => put(&mut response_type, "response_type", value)?,
                "scope" => put(&mut scope, "scope", value)?,
                "prompt" => put(&mut prompt, "prompt", value)?,
                "ui_locales" => put(&mut ui_locales, "ui_locales", value)?,
                "acr_values" => put(&mut acr_values, "acr_values", value)?,
                "state" => put(&mut state, "state", value)?,
                "nonce" => put(&mut nonce, "nonce", value)?,
                "display" => put(&mut display, "display", value)?,
                "max_age" => put(&mut max_age, "max_age", value)?,
                "login_hint" => put(&mut login_hint, "login_hint", value)?,
                "id_token_hint" => put(&mut id_token_hint, "id_token_hint", value)?,
                _ => {}
            }
        }

        let client_id = client_id
            .ok_or(ProtocolError::MissingParameter { name: "client_id" })?
            .to_owned();
        let redirect_uri = redirect_uri
            .ok_or(ProtocolError::MissingParameter {
                name: "redirect_uri",
            })?
            .to_owned();

        let mut prompts = BTreeSet::new();
        if let Some(raw) = prompt {
            for value in raw.split_whitespace() {
                let parsed = Prompt::from_wire(value)
                    .ok_or(ProtocolError::MalformedParameter { name: "prompt" })?;
                prompts.insert(parsed);
            }
        }

        let display = display
            .map(|raw| {
                DisplayMode::from_wire(raw)
                    .ok_or(ProtocolError::MalformedParameter { name: "display" })
            })
            .transpose()?;

        let max_age = max_age
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|_| ProtocolError::MalformedParameter { name: "max_age" })
            })
            .transpose()?;

        Ok(Self {
            client_id,
            redirect_uri,
            response_types: split_set(response_type),
            scopes: split_set(scope),
            prompts,
            ui_locales: split_list(ui_locales),
            acr_values: split_list(acr_values),
            state: state.map(str::to_owned),
            nonce: nonce.map(str::to_owned),
            display,
            max_age,
            login_hint: login_hint.map(str::to_owned),
            id_token_hint: id_token_hint.map(str::to_owned),
        })
    }

    /// The requesting client.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The redirect target, exactly as presented (not yet vetted).
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// The requested response types.
    #[must_use]
    pub fn response_types(&self) -> &BTreeSet<String> {
        &self.response_types
    }

    /// The requested scopes.
    #[must_use]
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// Whether a scope was requested.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// The requested prompts.
    #[must_use]
    pub fn prompts(&self) -> &BTreeSet<Prompt> {
        &self.prompts
    }

    /// Whether a prompt was requested.
    #[must_use]
    pub fn has_prompt(&self, prompt: Prompt) -> bool {
        self.prompts.contains(&prompt)
    }

    /// Preferred UI locales, most preferred first.
    #[must_use]
    pub fn ui_locales(&self) -> &[String] {
        &self.ui_locales
    }

    /// Requested authentication context class references, in preference
    /// order.
    #[must_use]
    pub fn acr_values(&self) -> &[String] {
        &self.acr_values
    }

    /// Opaque client state to echo back on every redirect.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Replay-protection nonce to embed in the id token.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// Requested presentation mode.
    #[must_use]
    pub fn display(&self) -> Option<DisplayMode> {
        self.display
    }

    /// Maximum acceptable authentication age in seconds.
    #[must_use]
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Login identifier hint.
    #[must_use]
    pub fn login_hint(&self) -> Option<&str> {
        self.login_hint.as_deref()
    }

    /// Previously issued id token hinting at the current session.
    #[must_use]
    pub fn id_token_hint(&self) -> Option<&str> {
        self.id_token_hint.as_deref()
    }
}

fn put<'a>(slot: &mut Option<&'a str>, name: &'static str, value: &'a str) -> ProtocolResult<()> {
    if slot.replace(value).is_some() {
        return Err(ProtocolError::MalformedParameter { name });
    }
    Ok(())
}

fn split_set(value: Option<&str>) -> BTreeSet<String> {
    value
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}
