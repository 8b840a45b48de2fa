//! Pipeline controller - single authority over one setup attempt

use crate::{
    core::{
        config::absolute_uri, Integration, Organization, PipelineError, PipelineState, ProviderDescriptor,
        ProviderRegistry, SetupRequest, StepOutcome,
    },
    persistence::IntegrationStore,
    pipeline::PipelineResponse,
    session::{SessionHandle, SessionRecord},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Long-lived collaborators shared by every controller
#[derive(Clone)]
pub struct PipelineServices {
    pub registry: Arc<ProviderRegistry>,
    pub store: Arc<dyn IntegrationStore>,
    /// Absolute URL prefix for redirects
    pub base_url: Option<String>,
}

impl PipelineServices {
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn IntegrationStore>) -> Self {
        Self {
            registry,
            store,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn absolute_uri(&self, path: &str) -> String {
        absolute_uri(self.base_url.as_deref(), path)
    }
}

/// Drives one in-progress setup attempt for a single request
///
/// Every state change is written to the session transport as a whole
/// record before the controller moves on.
pub struct PipelineController {
    services: PipelineServices,
    provider: Arc<ProviderDescriptor>,
    organization: Organization,
    user_id: String,
    integration: Option<Integration>,
    signature: String,
    step_index: usize,
    state: PipelineState,
    session: SessionHandle,
}

impl PipelineController {
    /// Resume the attempt stored in the session, or start a fresh one
    ///
    /// Only an unknown provider or a failing backend is reported; a session
    /// that cannot be trusted is discarded and the attempt starts over.
    pub async fn resolve(
        services: &PipelineServices,
        session: SessionHandle,
        request: &SetupRequest,
        organization: Organization,
        provider_id: &str,
    ) -> Result<Self, PipelineError> {
        let provider = services.registry.get(provider_id)?;
        let mut controller = Self::fresh(
            services.clone(),
            provider,
            organization,
            request.user_id.clone(),
            session,
        );

        let Some(bytes) = controller.session.read().await? else {
            return Ok(controller);
        };

        match controller.restore(&bytes).await {
            Ok(()) => {
                debug!(
                    "Resumed setup of {} for organization {} at step {}",
                    controller.provider.id, controller.organization.slug, controller.step_index
                );
            }
            Err(PipelineError::InvalidSession(reason)) => {
                error!(
                    provider = %controller.provider.id,
                    organization = %controller.organization.slug,
                    "{}",
                    reason
                );
                controller.clear_session().await?;
            }
            Err(PipelineError::IntegrationNotFound { id, organization_id }) => {
                warn!(
                    "integrations.setup.integration-not-found: integration {} for organization {}",
                    id, organization_id
                );
                controller.clear_session().await?;
            }
            Err(e) => return Err(e),
        }

        Ok(controller)
    }

    fn fresh(
        services: PipelineServices,
        provider: Arc<ProviderDescriptor>,
        organization: Organization,
        user_id: String,
        session: SessionHandle,
    ) -> Self {
        let signature = provider.signature();
        Self {
            services,
            provider,
            organization,
            user_id,
            integration: None,
            signature,
            step_index: 0,
            state: PipelineState::new(),
            session,
        }
    }

    /// Adopt a stored record; leaves the controller untouched on failure
    async fn restore(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        let record = SessionRecord::decode(bytes).map_err(|e| {
            PipelineError::InvalidSession(format!("integrations.setup.invalid-session-data: {}", e))
        })?;

        if record.signature != self.signature {
            return Err(PipelineError::InvalidSession(format!(
                "integrations.setup.invalid-signature: stored {} but provider {} has {}",
                record.signature, self.provider.id, self.signature
            )));
        }

        record
            .validate(
                &self.user_id,
                self.organization.id,
                &self.provider.id,
                &self.signature,
                self.provider.step_count(),
            )
            .map_err(|e| {
                PipelineError::InvalidSession(format!("integrations.setup.session-mismatch: {}", e))
            })?;

        let integration = match record.integration_id {
            Some(id) => {
                let found = self
                    .services
                    .store
                    .get(id, self.organization.id)
                    .await
                    .map_err(PipelineError::Store)?;
                match found {
                    Some(integration) => Some(integration),
                    None => {
                        return Err(PipelineError::IntegrationNotFound {
                            id,
                            organization_id: self.organization.id,
                        })
                    }
                }
            }
            None => None,
        };

        self.integration = integration;
        self.step_index = record.step_index;
        self.state = record.state;
        Ok(())
    }

    /// Run the current step, moving forward for as long as steps continue
    ///
    /// Reaching the end of the pipeline commits the integration.
    pub async fn current_step(
        &mut self,
        request: &SetupRequest,
    ) -> Result<PipelineResponse, PipelineError> {
        loop {
            if self.step_index >= self.provider.step_count() {
                return self.finish().await;
            }

            let step = Arc::clone(&self.provider.steps[self.step_index]);
            debug!(
                "Dispatching step {} ({}) of {}",
                self.step_index,
                step.identity(),
                self.provider.id
            );

            match step.advance(request, self).await? {
                StepOutcome::Render(page) => return Ok(PipelineResponse::Page(page)),
                StepOutcome::Continue => self.advance_step().await?,
                StepOutcome::Abort(message) => return self.abort(&message).await,
            }
        }
    }

    /// Move to the next step and persist the session
    ///
    /// Called by [`current_step`](Self::current_step) when a step continues;
    /// steps themselves return [`StepOutcome::Continue`] instead.
    pub async fn advance_step(&mut self) -> Result<(), PipelineError> {
        if self.step_index >= self.provider.step_count() {
            return Ok(());
        }
        self.step_index += 1;
        self.save_session().await
    }

    /// Store a value that survives until the pipeline finishes
    pub async fn bind_state(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), PipelineError> {
        self.state.insert(key.into(), value.into());
        self.save_session().await
    }

    /// Read a previously bound value
    pub fn fetch_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Re-authorize an existing integration instead of creating a new one
    pub async fn bind_integration(&mut self, integration: Integration) -> Result<(), PipelineError> {
        self.integration = Some(integration);
        self.save_session().await
    }

    /// Terminate the attempt with a user-visible message
    pub async fn abort(&mut self, message: &str) -> Result<PipelineResponse, PipelineError> {
        warn!(
            "Setup of {} for organization {} aborted at step {}: {}",
            self.provider.id, self.organization.slug, self.step_index, message
        );
        self.clear_session().await?;
        Ok(PipelineResponse::Aborted {
            message: format!(
                "There was an error setting up {}: {}",
                self.provider.name, message
            ),
            redirect_to: self.integrations_url(),
        })
    }

    /// Remove the session record (idempotent)
    pub async fn clear_session(&mut self) -> Result<(), PipelineError> {
        self.session.clear().await
    }

    /// Commit the accumulated state to the integration store
    ///
    /// The session survives a failed commit so the same state can be
    /// committed again.
    async fn finish(&mut self) -> Result<PipelineResponse, PipelineError> {
        debug_assert_eq!(self.step_index, self.provider.step_count());
        let metadata = self.provider.build_metadata(&self.state);
        let store = Arc::clone(&self.services.store);

        let integration = match &self.integration {
            Some(existing) => {
                store
                    .update(existing.id, metadata.clone())
                    .await
                    .map_err(PipelineError::Store)?;
                let mut updated = existing.clone();
                updated.metadata = metadata;
                updated
            }
            None => store
                .create_for_organization(
                    &self.provider.id,
                    &self.provider.name,
                    self.organization.id,
                    metadata,
                )
                .await
                .map_err(PipelineError::Store)?,
        };

        info!(
            "Installed {} integration {} for organization {}",
            self.provider.id, integration.id, self.organization.slug
        );
        self.integration = Some(integration.clone());
        self.clear_session().await?;

        Ok(PipelineResponse::Completed {
            integration,
            redirect_to: self.integrations_url(),
        })
    }

    async fn save_session(&mut self) -> Result<(), PipelineError> {
        let record = self.to_record();
        self.session.write(&record).await
    }

    fn to_record(&self) -> SessionRecord {
        SessionRecord {
            user_id: self.user_id.clone(),
            organization_id: self.organization.id,
            provider_id: self.provider.id.clone(),
            integration_id: self.integration.as_ref().map(|i| i.id),
            signature: self.signature.clone(),
            step_index: self.step_index,
            state: self.state.clone(),
        }
    }

    /// Absolute URL of this pipeline's setup entry point
    pub fn get_redirect_url(&self) -> String {
        self.services.absolute_uri(&format!(
            "/organizations/{}/integrations/{}/setup/",
            self.organization.slug, self.provider.id
        ))
    }

    fn integrations_url(&self) -> String {
        self.services
            .absolute_uri(&format!("/organizations/{}/integrations/", self.organization.slug))
    }

    pub fn provider(&self) -> &ProviderDescriptor {
        &self.provider
    }

    pub fn organization(&self) -> &Organization {
        &self.organization
    }

    pub fn integration(&self) -> Option<&Integration> {
        self.integration.as_ref()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Hand the session back to the caller once the request is done
    pub fn into_session(self) -> SessionHandle {
        self.session
    }
}
