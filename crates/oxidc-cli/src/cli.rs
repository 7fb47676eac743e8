//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// oxidc - OpenID Connect provider core demo driver.
#[derive(Debug, Parser)]
#[command(name = "oxidc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON); built-in defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the discovery metadata for the active configuration.
    Metadata,

    /// Generate a signing pool and print its JSON Web Key Set.
    Jwks {
        /// Print the private projection (with exponents) instead of the
        /// public one.
        #[arg(long)]
        private: bool,
    },

    /// Sign a claims object and verify the result against the pool.
    Sign {
        /// Claims JSON, for example '{"sub":"alice"}'.
        claims: String,
    },

    /// Walk the full authorization-code flow against the demo realm.
    Flow(FlowArgs),
}

/// Flow arguments.
#[derive(Debug, clap::Args)]
pub struct FlowArgs {
    /// Username presented at the authentication step.
    #[arg(long, default_value = "alice")]
    pub username: String,

    /// Password for the user.
    #[arg(long, default_value = "wonderland")]
    pub password: String,

    /// Requested scope values, space-delimited.
    #[arg(long, default_value = "openid profile email")]
    pub scope: String,
}
