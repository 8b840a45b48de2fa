//! Server startup and shutdown

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info, warn};

use crate::core::config::ServerConfig;
use crate::features::{ConfigFeatureGate, FeatureGate};
use crate::persistence::IntegrationStore;
use crate::pipeline::{PipelineServices, SetupEntry};
use crate::providers::default_registry;
use crate::session::InMemorySessionStore;
use crate::web::{app, AppState};

/// How often expired sessions are swept
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Open the integration store configured for this build
pub async fn open_store(config: &ServerConfig) -> Result<Arc<dyn IntegrationStore>> {
    #[cfg(feature = "sqlite")]
    {
        let path = config.database_path()?;
        let store = crate::persistence::SqliteIntegrationStore::new(&path.to_string_lossy())
            .await
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        info!("Using integration database at {}", path.display());
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        info!("Using in-memory integration store");
        Ok(Arc::new(crate::persistence::InMemoryIntegrationStore::new()))
    }
}

/// Build application state from configuration
pub async fn build_state(config: ServerConfig) -> Result<AppState> {
    config.validate().context("Invalid server config")?;

    let registry = default_registry().context("Failed to register providers")?;
    let store = open_store(&config).await?;

    let mut services = PipelineServices::new(Arc::new(registry), store);
    if let Some(base_url) = &config.base_url {
        services = services.with_base_url(base_url.clone());
    }

    let features: Arc<dyn FeatureGate> = Arc::new(ConfigFeatureGate::from_config(&config));
    let sessions = Arc::new(InMemorySessionStore::new(config.session_ttl_secs));

    let purge = Arc::clone(&sessions);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = purge.purge_expired().await;
            if removed > 0 {
                debug!("Purged {} expired sessions", removed);
            }
        }
    });

    Ok(AppState {
        entry: SetupEntry::new(services, Arc::clone(&features)),
        features,
        sessions,
        config: Arc::new(config),
    })
}

/// Run the HTTP server until Ctrl+C
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = config.bind_address();
    let state = build_state(config).await?;
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server listening on: http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
