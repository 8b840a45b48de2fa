//! Shared fixtures for setup pipeline tests

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use integration_pipeline::core::{
    Integration, Metadata, Organization, PipelineError, PipelineState, PipelineStep,
    ProviderDescriptor, ProviderRegistry, RenderedPage, SetupRequest, StepOutcome,
};
use integration_pipeline::persistence::{InMemoryIntegrationStore, IntegrationStore};
use integration_pipeline::pipeline::{PipelineController, PipelineServices};
use integration_pipeline::providers::example_provider;
use integration_pipeline::session::{InMemorySessionStore, SessionHandle, SessionTransport};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const USER: &str = "42";
pub const MULTI_PROVIDER_ID: &str = "multi";
pub const ABORTING_PROVIDER_ID: &str = "aborting";

pub fn acme() -> Organization {
    Organization::new(1, "acme", "Acme")
}

/// Integration store that counts writes and can be told to fail
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryIntegrationStore,
    fail_writes: AtomicBool,
    fail_attach: AtomicBool,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Fail only when attaching an integration to an organization
    pub fn set_attach_failing(&self, failing: bool) {
        self.fail_attach.store(failing, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("database is unavailable");
        }
        Ok(())
    }

    fn check_attach(&self) -> Result<()> {
        self.check()?;
        if self.fail_attach.load(Ordering::SeqCst) {
            anyhow::bail!("organization link table is locked");
        }
        Ok(())
    }
}

#[async_trait]
impl IntegrationStore for CountingStore {
    async fn create(
        &self,
        provider_id: &str,
        provider_name: &str,
        metadata: Metadata,
    ) -> Result<Integration> {
        self.check()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(provider_id, provider_name, metadata).await
    }

    async fn create_for_organization(
        &self,
        provider_id: &str,
        provider_name: &str,
        organization_id: u64,
        metadata: Metadata,
    ) -> Result<Integration> {
        // Fails before anything is written, as a rolled back transaction would
        self.check_attach()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner
            .create_for_organization(provider_id, provider_name, organization_id, metadata)
            .await
    }

    async fn get(&self, id: Uuid, organization_id: u64) -> Result<Option<Integration>> {
        self.inner.get(id, organization_id).await
    }

    async fn update(&self, id: Uuid, metadata: Metadata) -> Result<()> {
        self.check()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, metadata).await
    }

    async fn attach_to_organization(&self, integration_id: Uuid, organization_id: u64) -> Result<()> {
        self.check_attach()?;
        self.inner.attach_to_organization(integration_id, organization_id).await
    }

    async fn list_for_organization(
        &self,
        organization_id: u64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Integration>> {
        self.inner.list_for_organization(organization_id, offset, limit).await
    }
}

/// Asks for an account name on POST, binds it, then continues
pub struct AccountStep;

#[async_trait]
impl PipelineStep for AccountStep {
    async fn advance(
        &self,
        request: &SetupRequest,
        controller: &mut PipelineController,
    ) -> Result<StepOutcome, PipelineError> {
        match request.form_field("account") {
            Some(account) => {
                controller.bind_state("account", account).await?;
                Ok(StepOutcome::Continue)
            }
            None => Ok(StepOutcome::Render(RenderedPage::html("<form>account</form>"))),
        }
    }
}

/// Waits for an OAuth-style `code` in the query string
pub struct CallbackStep;

#[async_trait]
impl PipelineStep for CallbackStep {
    async fn advance(
        &self,
        request: &SetupRequest,
        controller: &mut PipelineController,
    ) -> Result<StepOutcome, PipelineError> {
        if controller.fetch_state("account").is_none() {
            return Ok(StepOutcome::Abort("account was never chosen".to_string()));
        }
        match request.query_param("code") {
            Some(code) => {
                controller.bind_state("token", format!("token-{}", code)).await?;
                Ok(StepOutcome::Continue)
            }
            None => Ok(StepOutcome::Render(RenderedPage::html("<a>authorize</a>"))),
        }
    }
}

/// Gives up immediately
pub struct RefusingStep;

#[async_trait]
impl PipelineStep for RefusingStep {
    async fn advance(
        &self,
        _request: &SetupRequest,
        _controller: &mut PipelineController,
    ) -> Result<StepOutcome, PipelineError> {
        Ok(StepOutcome::Abort("the remote service refused".to_string()))
    }
}

fn account_metadata(state: &PipelineState) -> Metadata {
    let mut metadata = Metadata::new();
    for key in ["account", "token"] {
        if let Some(value) = state.get(key) {
            metadata.insert(key.to_string(), value.clone());
        }
    }
    if let Some(account) = state.get("account") {
        metadata.insert("name".to_string(), account.clone());
    }
    metadata
}

/// Two-step provider: account form, then OAuth callback
pub fn multi_provider() -> ProviderDescriptor {
    ProviderDescriptor::new(MULTI_PROVIDER_ID, "Multi")
        .with_step(AccountStep)
        .with_step(CallbackStep)
        .with_metadata_builder(account_metadata)
}

pub fn aborting_provider() -> ProviderDescriptor {
    ProviderDescriptor::new(ABORTING_PROVIDER_ID, "Aborting").with_step(RefusingStep)
}

pub fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(example_provider()).unwrap();
    registry.register(multi_provider()).unwrap();
    registry.register(aborting_provider()).unwrap();
    registry
}

/// Everything a test needs to drive the controller across requests
pub struct Harness {
    pub services: PipelineServices,
    pub store: Arc<CountingStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub session_id: String,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(CountingStore::new());
        let services = PipelineServices::new(Arc::new(registry()), store.clone());
        Self {
            services,
            store,
            sessions: Arc::new(InMemorySessionStore::new(3600)),
            session_id: "test-session".to_string(),
        }
    }

    pub fn session(&self) -> SessionHandle {
        let transport: Arc<dyn SessionTransport> = self.sessions.clone();
        SessionHandle::new(transport, self.session_id.clone())
    }

    pub async fn controller(
        &self,
        request: &SetupRequest,
        provider_id: &str,
    ) -> Result<PipelineController, PipelineError> {
        PipelineController::resolve(&self.services, self.session(), request, acme(), provider_id)
            .await
    }

    /// Run one request end to end
    pub async fn request(
        &self,
        request: &SetupRequest,
        provider_id: &str,
    ) -> Result<integration_pipeline::pipeline::PipelineResponse, PipelineError> {
        let mut controller = self.controller(request, provider_id).await?;
        controller.current_step(request).await
    }

    /// Raw bytes currently stored for the pipeline
    pub async fn stored(&self) -> Option<Vec<u8>> {
        self.session().read().await.unwrap()
    }

    pub async fn store_raw(&self, bytes: &[u8]) {
        self.sessions
            .write(
                &self.session_id,
                integration_pipeline::session::SESSION_KEY,
                bytes.to_vec(),
            )
            .await
            .unwrap();
    }
}
