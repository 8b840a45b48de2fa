//! CLI command definitions

use clap::Args;

/// Start the HTTP server
#[derive(Debug, Args, Clone)]
pub struct ServeCommand {
    /// Path to server YAML config
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the configured bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the configured port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// List registered providers
#[derive(Debug, Args, Clone)]
pub struct ProvidersCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a server configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to server YAML config
    #[arg(short, long)]
    pub config: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List integrations installed for an organization
#[derive(Debug, Args, Clone)]
pub struct IntegrationsCommand {
    /// Path to server YAML config
    #[arg(short, long)]
    pub config: String,

    /// Organization slug
    #[arg(short, long)]
    pub organization: String,

    /// Number of integrations to show
    #[arg(short, long, default_value_t = 100)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
