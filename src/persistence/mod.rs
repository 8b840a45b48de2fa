//! Persistence layer for installed integrations

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteIntegrationStore;

use crate::core::{Integration, Metadata};
use anyhow::Result;
use std::collections::HashMap;
use uuid::Uuid;

/// Trait for integration store backends
///
/// Only the pipeline controller's finish step writes here.
#[async_trait::async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Create a new integration for a provider
    async fn create(
        &self,
        provider_id: &str,
        provider_name: &str,
        metadata: Metadata,
    ) -> Result<Integration>;

    /// Load an integration attached to an organization
    async fn get(&self, id: Uuid, organization_id: u64) -> Result<Option<Integration>>;

    /// Replace an integration's metadata
    async fn update(&self, id: Uuid, metadata: Metadata) -> Result<()>;

    /// Create an integration already attached to an organization
    ///
    /// Either both the integration and its attachment exist afterwards or
    /// neither does, so a failed commit can be retried without leaving an
    /// orphan behind.
    async fn create_for_organization(
        &self,
        provider_id: &str,
        provider_name: &str,
        organization_id: u64,
        metadata: Metadata,
    ) -> Result<Integration>;

    /// Attach an integration to an organization (idempotent)
    async fn attach_to_organization(&self, integration_id: Uuid, organization_id: u64)
        -> Result<()>;

    /// List integrations attached to an organization, ordered by name
    async fn list_for_organization(
        &self,
        organization_id: u64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Integration>>;
}

#[derive(Default)]
struct InMemoryState {
    integrations: HashMap<Uuid, Integration>,
    by_organization: HashMap<u64, Vec<Uuid>>,
}

impl InMemoryState {
    fn attach(&mut self, integration_id: Uuid, organization_id: u64) {
        let ids = self.by_organization.entry(organization_id).or_default();
        if !ids.contains(&integration_id) {
            ids.push(integration_id);
        }
    }
}

/// In-memory integration store (for testing or ephemeral use)
pub struct InMemoryIntegrationStore {
    state: tokio::sync::RwLock<InMemoryState>,
}

impl InMemoryIntegrationStore {
    pub fn new() -> Self {
        Self {
            state: tokio::sync::RwLock::new(InMemoryState::default()),
        }
    }
}

impl Default for InMemoryIntegrationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IntegrationStore for InMemoryIntegrationStore {
    async fn create(
        &self,
        provider_id: &str,
        provider_name: &str,
        metadata: Metadata,
    ) -> Result<Integration> {
        let integration = Integration::new(provider_id, provider_name, metadata);
        let mut state = self.state.write().await;
        state.integrations.insert(integration.id, integration.clone());
        Ok(integration)
    }

    async fn create_for_organization(
        &self,
        provider_id: &str,
        provider_name: &str,
        organization_id: u64,
        metadata: Metadata,
    ) -> Result<Integration> {
        let integration = Integration::new(provider_id, provider_name, metadata);
        let mut state = self.state.write().await;
        state.integrations.insert(integration.id, integration.clone());
        state.attach(integration.id, organization_id);
        Ok(integration)
    }

    async fn get(&self, id: Uuid, organization_id: u64) -> Result<Option<Integration>> {
        let state = self.state.read().await;
        let attached = state
            .by_organization
            .get(&organization_id)
            .is_some_and(|ids| ids.contains(&id));
        if !attached {
            return Ok(None);
        }
        Ok(state.integrations.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, metadata: Metadata) -> Result<()> {
        let mut state = self.state.write().await;
        match state.integrations.get_mut(&id) {
            Some(integration) => {
                integration.metadata = metadata;
                Ok(())
            }
            None => anyhow::bail!("Integration {} does not exist", id),
        }
    }

    async fn attach_to_organization(
        &self,
        integration_id: Uuid,
        organization_id: u64,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.integrations.contains_key(&integration_id) {
            anyhow::bail!("Integration {} does not exist", integration_id);
        }
        state.attach(integration_id, organization_id);
        Ok(())
    }

    async fn list_for_organization(
        &self,
        organization_id: u64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Integration>> {
        let state = self.state.read().await;
        let mut result: Vec<Integration> = state
            .by_organization
            .get(&organization_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.integrations.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        result.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(result.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(name: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("name".to_string(), json!(name));
        metadata
    }

    #[tokio::test]
    async fn test_create_attach_get() {
        let store = InMemoryIntegrationStore::new();
        let integration = store.create("example", "Example", Metadata::new()).await.unwrap();

        // Not visible until attached
        assert!(store.get(integration.id, 1).await.unwrap().is_none());

        store.attach_to_organization(integration.id, 1).await.unwrap();
        let loaded = store.get(integration.id, 1).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Example");

        // Scoped to the organization
        assert!(store.get(integration.id, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let store = InMemoryIntegrationStore::new();
        let integration = store.create("example", "Example", Metadata::new()).await.unwrap();
        store.attach_to_organization(integration.id, 1).await.unwrap();

        store.update(integration.id, named("Ada")).await.unwrap();
        let loaded = store.get(integration.id, 1).await.unwrap().unwrap();
        assert_eq!(loaded.metadata.get("name"), Some(&json!("Ada")));

        assert!(store.update(Uuid::new_v4(), Metadata::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_attach_is_idempotent() {
        let store = InMemoryIntegrationStore::new();
        let integration = store.create("example", "Example", Metadata::new()).await.unwrap();
        store.attach_to_organization(integration.id, 1).await.unwrap();
        store.attach_to_organization(integration.id, 1).await.unwrap();

        let listed = store.list_for_organization(1, 0, 100).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_for_organization_is_attached() {
        let store = InMemoryIntegrationStore::new();
        let integration = store
            .create_for_organization("example", "Example", 1, named("Ada"))
            .await
            .unwrap();

        let loaded = store.get(integration.id, 1).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ada");
        assert!(store.get(integration.id, 2).await.unwrap().is_none());
        assert_eq!(store.list_for_organization(1, 0, 100).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_ordered_by_name_and_paginated() {
        let store = InMemoryIntegrationStore::new();
        for name in ["Zulip", "Asana", "Jira"] {
            let integration = store.create("example", "Example", named(name)).await.unwrap();
            store.attach_to_organization(integration.id, 1).await.unwrap();
        }

        let names: Vec<_> = store
            .list_for_organization(1, 0, 100)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Asana", "Jira", "Zulip"]);

        let page = store.list_for_organization(1, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Jira");

        assert!(store.list_for_organization(2, 0, 100).await.unwrap().is_empty());
    }
}
