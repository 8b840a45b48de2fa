//! Error taxonomy for setup pipelines

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while resolving or driving a setup pipeline
///
/// `InvalidSession` and `IntegrationNotFound` are recovered inside
/// [`PipelineController::resolve`](crate::pipeline::PipelineController::resolve)
/// by starting over; callers only ever see the remaining variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Integration {id} not found for organization {organization_id}")]
    IntegrationNotFound { id: Uuid, organization_id: u64 },

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Integration store error: {0}")]
    Store(anyhow::Error),

    #[error("Session transport error: {0}")]
    Transport(anyhow::Error),

    #[error("Feature gate error: {0}")]
    Features(anyhow::Error),
}

impl PipelineError {
    /// Whether the error is caused by the client rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::UnknownProvider(_))
    }
}

/// Errors raised while populating a provider registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Provider '{0}' is already registered")]
    Duplicate(String),

    #[error("Provider id must not be empty")]
    EmptyId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_client_error() {
        assert!(PipelineError::UnknownProvider("nope".to_string()).is_client_error());
        assert!(!PipelineError::Store(anyhow::anyhow!("disk full")).is_client_error());
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::IntegrationNotFound {
            id: Uuid::nil(),
            organization_id: 7,
        };
        assert!(err.to_string().contains("organization 7"));
        assert_eq!(
            RegistryError::Duplicate("example".to_string()).to_string(),
            "Provider 'example' is already registered"
        );
    }
}
