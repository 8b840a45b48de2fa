//! Provider registry - identifier to descriptor lookup

use crate::core::{
    error::{PipelineError, RegistryError},
    provider::ProviderDescriptor,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of known providers
///
/// Populated once at startup and then shared read-only between requests.
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<ProviderDescriptor>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider descriptor
    pub fn register(&mut self, descriptor: ProviderDescriptor) -> Result<(), RegistryError> {
        if descriptor.id.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if self.providers.contains_key(&descriptor.id) {
            return Err(RegistryError::Duplicate(descriptor.id));
        }
        debug!(
            "Registered provider {} with {} step(s)",
            descriptor.id,
            descriptor.step_count()
        );
        self.providers
            .insert(descriptor.id.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Look up a provider by id
    pub fn get(&self, id: &str) -> Result<Arc<ProviderDescriptor>, PipelineError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownProvider(id.to_string()))
    }

    /// All providers, ordered by id
    pub fn all(&self) -> impl Iterator<Item = &Arc<ProviderDescriptor>> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
