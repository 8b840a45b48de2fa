//! Setup entry - resumes or starts a pipeline for an inbound request

use crate::{
    core::{config::INTEGRATIONS_FEATURE, Organization, PipelineError, SetupRequest},
    features::FeatureGate,
    pipeline::{PipelineController, PipelineResponse, PipelineServices},
    session::SessionHandle,
};
use std::sync::Arc;
use tracing::info;

/// Result of handling a setup request
#[derive(Debug)]
pub enum EntryResponse {
    /// The request was refused before any pipeline work
    Denied { redirect_to: String },

    /// The pipeline ran; the session is handed back for the transport
    Pipeline {
        response: PipelineResponse,
        session: SessionHandle,
    },
}

/// Externally reachable setup operation
///
/// Authentication and organization membership are checked by the caller;
/// the feature flag is checked here, before the controller is built.
#[derive(Clone)]
pub struct SetupEntry {
    services: PipelineServices,
    features: Arc<dyn FeatureGate>,
}

impl SetupEntry {
    pub fn new(services: PipelineServices, features: Arc<dyn FeatureGate>) -> Self {
        Self { services, features }
    }

    pub fn services(&self) -> &PipelineServices {
        &self.services
    }

    /// Handle one request for `(organization, provider_id)`
    pub async fn handle(
        &self,
        request: &SetupRequest,
        session: SessionHandle,
        organization: Organization,
        provider_id: &str,
    ) -> Result<EntryResponse, PipelineError> {
        let enabled = self
            .features
            .has_feature(INTEGRATIONS_FEATURE, &organization, &request.user_id)
            .await
            .map_err(PipelineError::Features)?;
        if !enabled {
            info!(
                "Integration setup refused for organization {}: feature disabled",
                organization.slug
            );
            return Ok(EntryResponse::Denied {
                redirect_to: "/".to_string(),
            });
        }

        let mut controller =
            PipelineController::resolve(&self.services, session, request, organization, provider_id)
                .await?;
        let response = controller.current_step(request).await?;

        Ok(EntryResponse::Pipeline {
            response,
            session: controller.into_session(),
        })
    }
}
