//! # oxidc CLI
//!
//! Demo driver for the oxidc provider core: composes the provider with an
//! in-memory realm and exercises key generation, signing, and the full
//! authorization-code round trip.

#![forbid(unsafe_code)]
#![deny(warnings)]

mod cli;
mod commands;
mod output;
mod realm;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oxidc_core::{Config, ConfigError};

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "oxidc=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Metadata => commands::run_metadata(config),
        Command::Jwks { private } => commands::run_jwks(config, private),
        Command::Sign { claims } => commands::run_sign(config, &claims),
        Command::Flow(args) => commands::run_flow(config, &args),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}
