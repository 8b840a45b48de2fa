//! API response types

use crate::core::{ConfigField, Integration, ProviderDescriptor};
use serde::{Deserialize, Serialize};

/// Provider reference inside an integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub id: String,
}

/// Serialized integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationResponse {
    pub id: String,
    pub name: String,
    pub provider: ProviderRef,
}

impl From<&Integration> for IntegrationResponse {
    fn from(integration: &Integration) -> Self {
        Self {
            id: integration.id.to_string(),
            name: integration.name.clone(),
            provider: ProviderRef {
                id: integration.provider.clone(),
            },
        }
    }
}

/// Serialized provider available for installation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub id: String,
    pub name: String,
    pub config: Vec<ConfigField>,
    pub setup_uri: String,
}

impl ProviderResponse {
    pub fn new(provider: &ProviderDescriptor, setup_uri: String) -> Self {
        Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            config: provider.config_schema.clone(),
            setup_uri,
        }
    }
}

/// Available providers for an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfigResponse {
    pub providers: Vec<ProviderResponse>,
}
