//! Protocol layer of the provider: everything between raw request
//! parameters and a signed, stored, redeemable authorization.
//!
//! ## Pieces
//!
//! - [`request`] / [`authorize`] — authentication-request parsing and the
//!   ordered validation pipeline, including redirect assembly;
//! - [`keys`] — the rotating signing-key pool, JWKS projections, and the
//!   symmetric service key for opaque payloads;
//! - [`bearer`] — bearer-token and client-credential validation;
//! - [`discovery`] — provider metadata for the discovery document;
//! - [`provider`] — the composition of all of the above over a token store
//!   and the deployment-supplied collaborators;
//! - [`error`] — the per-request error taxonomy.
//!
//! Nothing in this crate performs I/O: an embedding layer maps
//! [`ProtocolError`] values onto HTTP statuses, redirects, and challenge
//! headers using the helpers they expose.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authorize;
pub mod bearer;
pub mod discovery;
pub mod error;
pub mod jwks;
pub mod keys;
pub mod provider;
pub mod request;

pub use authorize::{AuthorizationValidator, RequestContext};
pub use bearer::BearerValidator;
pub use discovery::ProviderMetadata;
pub use error::{BearerErrorKind, ProtocolError, ProtocolErrorKind, ProtocolResult};
pub use jwks::{JsonWebKey, JsonWebKeySet};
pub use keys::KeyService;
pub use provider::{AuthorizationSuccess, OidcProvider};
pub use request::{AuthenticationRequest, DisplayMode, Prompt};
