//! Built-in integration providers

pub mod example;

pub use example::{example_provider, ExampleSetupStep, EXAMPLE_PROVIDER_ID};

use crate::core::{ProviderRegistry, RegistryError};

/// Registry populated with every built-in provider
pub fn default_registry() -> Result<ProviderRegistry, RegistryError> {
    let mut registry = ProviderRegistry::new();
    registry.register(example_provider())?;
    Ok(registry)
}
