//! HTTP surface for integration setup

pub mod error;
pub mod handlers;
pub mod responses;
pub mod server;

use crate::{
    core::config::ServerConfig, features::FeatureGate, pipeline::SetupEntry,
    session::SessionTransport,
};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use handlers::create_router;
pub use server::serve;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Setup entry point, owning the registry and integration store
    pub entry: SetupEntry,

    /// Feature flag backend for the REST endpoints
    pub features: Arc<dyn FeatureGate>,

    /// Server-side session storage
    pub sessions: Arc<dyn SessionTransport>,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

/// Router with state and request tracing attached
pub fn app(state: AppState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
