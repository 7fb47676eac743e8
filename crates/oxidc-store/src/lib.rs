//! In-memory token storage for the provider.
//!
//! One record is kept per successful authorization, reachable through every
//! credential that refers to it: the opaque access token, the optional
//! refresh token, the single-use authorization code, and the consent
//! identity the grant was made under. All indices live behind a single
//! mutex, so a stored record becomes visible in all of them at once.
//!
//! Absence is not an error here: lookups return [`Option`] and the code
//! claim returns [`bool`]. Expiry is enforced at lookup time; there is no
//! background eviction.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod record;
pub mod store;

pub use record::{ConsentKey, TokenRecord, TokenResponse};
pub use store::TokenStore;
