use anyhow::{Context, Result};
use integration_pipeline::cli::commands::{
    IntegrationsCommand, ProvidersCommand, ServeCommand, ValidateCommand,
};
use integration_pipeline::cli::output::*;
use integration_pipeline::cli::{Cli, Command};
use integration_pipeline::core::config::ServerConfig;
use integration_pipeline::persistence::IntegrationStore;
use integration_pipeline::providers::default_registry;
use integration_pipeline::web;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Serve(cmd) => serve(cmd).await?,
        Command::Providers(cmd) => list_providers(cmd)?,
        Command::Validate(cmd) => validate_config(cmd)?,
        Command::Integrations(cmd) => list_integrations(cmd).await?,
    }

    Ok(())
}

async fn serve(cmd: &ServeCommand) -> Result<()> {
    let mut config = match &cmd.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load server config from {}", path))?,
        None => ServerConfig::default(),
    };
    if let Some(host) = &cmd.host {
        config.host = host.clone();
    }
    if let Some(port) = cmd.port {
        config.port = port;
    }

    println!(
        "{} Starting integration setup server on {}",
        ROCKET,
        style(config.bind_address()).bold()
    );
    if config.organizations.is_empty() {
        println!(
            "{} No organizations configured; every setup request will be sent to login",
            WARN
        );
    }

    web::serve(config).await
}

fn list_providers(cmd: &ProvidersCommand) -> Result<()> {
    let registry = default_registry().context("Failed to register providers")?;

    if cmd.json {
        let providers: Vec<_> = registry
            .all()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "name": p.name,
                    "steps": p.step_identities(),
                    "signature": p.signature(),
                    "config": p.config_schema,
                })
            })
            .collect();
        let data = serde_json::json!({ "providers": providers });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Registered providers:", INFO);
    for provider in registry.all() {
        println!("  {}", format_provider(provider));
        for field in &provider.config_schema {
            println!("      {}", format_config_field(field));
        }
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand) -> Result<()> {
    match ServerConfig::from_file(&cmd.config) {
        Ok(config) => {
            println!(
                "{} Server config is valid: {}",
                CHECK,
                style(&cmd.config).bold()
            );
            println!("  Address: {}", style(config.bind_address()).cyan());
            println!("  Organizations: {}", style(config.organizations.len()).cyan());
            for org in &config.organizations {
                println!(
                    "    {} {} ({} members, {} features)",
                    style(&org.slug).bold(),
                    style(&org.name).dim(),
                    org.members.len(),
                    org.features.len()
                );
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

async fn list_integrations(cmd: &IntegrationsCommand) -> Result<()> {
    let config = ServerConfig::from_file(&cmd.config)
        .with_context(|| format!("Failed to load server config from {}", cmd.config))?;
    let org = config
        .organization(&cmd.organization)
        .with_context(|| format!("Unknown organization: {}", cmd.organization))?;

    let store = web::server::open_store(&config).await?;
    let integrations = store.list_for_organization(org.id, 0, cmd.limit).await?;

    if cmd.json {
        let data = serde_json::json!({ "integrations": integrations });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if integrations.is_empty() {
        println!(
            "{} No integrations installed for {}",
            INFO,
            style(&org.slug).bold()
        );
        return Ok(());
    }

    println!(
        "{} Integrations for {}:",
        INFO,
        style(&org.name).bold()
    );
    for integration in &integrations {
        println!("  {}", format_integration(integration));
    }

    Ok(())
}
