//! Feature flags gating the integrations surface

use crate::core::{config::ServerConfig, Organization};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Trait for feature flag backends
#[async_trait::async_trait]
pub trait FeatureGate: Send + Sync {
    /// Whether `flag` is enabled for an organization and actor
    async fn has_feature(&self, flag: &str, organization: &Organization, actor: &str)
        -> Result<bool>;
}

/// Feature gate backed by per-organization flag lists
#[derive(Debug, Default, Clone)]
pub struct ConfigFeatureGate {
    flags: HashMap<u64, HashSet<String>>,
}

impl ConfigFeatureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the gate from the organizations in a server config
    pub fn from_config(config: &ServerConfig) -> Self {
        let flags = config
            .organizations
            .iter()
            .map(|org| (org.id, org.features.iter().cloned().collect()))
            .collect();
        Self { flags }
    }

    /// Enable a flag for an organization
    pub fn enable(mut self, organization_id: u64, flag: &str) -> Self {
        self.flags
            .entry(organization_id)
            .or_default()
            .insert(flag.to_string());
        self
    }
}

#[async_trait::async_trait]
impl FeatureGate for ConfigFeatureGate {
    async fn has_feature(
        &self,
        flag: &str,
        organization: &Organization,
        _actor: &str,
    ) -> Result<bool> {
        Ok(self
            .flags
            .get(&organization.id)
            .is_some_and(|flags| flags.contains(flag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::INTEGRATIONS_FEATURE;

    #[tokio::test]
    async fn test_enabled_flag() {
        let gate = ConfigFeatureGate::new().enable(1, INTEGRATIONS_FEATURE);
        let acme = Organization::new(1, "acme", "Acme");
        let other = Organization::new(2, "other", "Other");

        assert!(gate.has_feature(INTEGRATIONS_FEATURE, &acme, "42").await.unwrap());
        assert!(!gate.has_feature("organizations:other", &acme, "42").await.unwrap());
        assert!(!gate.has_feature(INTEGRATIONS_FEATURE, &other, "42").await.unwrap());
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = ServerConfig::from_yaml(
            r#"
organizations:
  - id: 1
    slug: "acme"
    name: "Acme"
    features: ["organizations:integrations-v3"]
  - id: 2
    slug: "other"
    name: "Other"
"#,
        )
        .unwrap();

        let gate = ConfigFeatureGate::from_config(&config);
        let acme = config.organization("acme").unwrap().organization();
        let other = config.organization("other").unwrap().organization();
        assert!(gate.has_feature(INTEGRATIONS_FEATURE, &acme, "1").await.unwrap());
        assert!(!gate.has_feature(INTEGRATIONS_FEATURE, &other, "1").await.unwrap());
    }
}
