//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{IntegrationsCommand, ProvidersCommand, ServeCommand, ValidateCommand};
use std::ffi::OsString;

/// Integration setup pipelines for organizations
#[derive(Debug, Parser, Clone)]
#[command(name = "integration-pipeline")]
#[command(author = "Integration Pipeline Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Multi-step setup pipelines for third-party integrations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Start the setup server
    Serve(ServeCommand),

    /// List registered providers
    Providers(ProvidersCommand),

    /// Validate a server configuration
    Validate(ValidateCommand),

    /// List installed integrations for an organization
    Integrations(IntegrationsCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
