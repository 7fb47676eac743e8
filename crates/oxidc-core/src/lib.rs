//! # oxidc-core
//!
//! Foundation crate for the oxidc identity provider: the configuration tree
//! and the collaborator contracts the protocol engine is composed with.
//!
//! The provider core never looks up collaborators by name or loads them from
//! configuration. Implementations of [`ClientManager`], [`Authenticator`],
//! and [`UserinfoProvider`] are constructed by the embedding application and
//! handed to the provider at composition time.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod traits;

pub use config::{Config, ConfigError, KeyConfig, ProviderConfig, TokenConfig};
pub use traits::{Authenticator, ClientManager, UserinfoProvider};
