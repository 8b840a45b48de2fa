//! Server configuration from YAML

use crate::core::integration::Organization;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Feature flag gating the integrations surface
pub const INTEGRATIONS_FEATURE: &str = "organizations:integrations-v3";

/// Top-level server configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Absolute URL prefix used when building redirect URLs
    #[serde(default)]
    pub base_url: Option<String>,

    /// SQLite database path (defaults to the local data directory)
    #[serde(default)]
    pub database_path: Option<String>,

    /// Seconds an untouched setup session stays valid
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Name of the session cookie
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Known organizations
    #[serde(default)]
    pub organizations: Vec<OrganizationConfig>,
}

/// Organization definition with its members and enabled features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    pub id: u64,

    pub slug: String,

    pub name: String,

    /// User ids allowed to manage integrations
    #[serde(default)]
    pub members: Vec<String>,

    /// Enabled feature flags
    #[serde(default)]
    pub features: Vec<String>,
}

impl OrganizationConfig {
    /// The organization model
    pub fn organization(&self) -> Organization {
        Organization::new(self.id, self.slug.clone(), self.name.clone())
    }

    /// Check whether a user belongs to the organization
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_session_ttl() -> u64 {
    86_400
}

fn default_session_cookie() -> String {
    "integration_session".to_string()
}

/// Prefix `path` with `base_url`, if one is configured
pub fn absolute_uri(base_url: Option<&str>, path: &str) -> String {
    match base_url {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
        None => path.to_string(),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            database_path: None,
            session_ttl_secs: default_session_ttl(),
            session_cookie: default_session_cookie(),
            organizations: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load server configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse server configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the server configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port must be greater than 0");
        }
        if self.session_cookie.trim().is_empty() {
            anyhow::bail!("Session cookie name must not be empty");
        }
        if self.session_ttl_secs == 0 {
            anyhow::bail!("Session TTL must be greater than 0");
        }

        let mut seen_ids = HashSet::new();
        let mut seen_slugs = HashSet::new();
        for org in &self.organizations {
            if org.slug.trim().is_empty() {
                anyhow::bail!("Organization {} has an empty slug", org.id);
            }
            if !seen_ids.insert(org.id) {
                anyhow::bail!("Duplicate organization id: {}", org.id);
            }
            if !seen_slugs.insert(org.slug.as_str()) {
                anyhow::bail!("Duplicate organization slug: {}", org.slug);
            }
        }

        Ok(())
    }

    /// Find an organization by slug
    pub fn organization(&self, slug: &str) -> Option<&OrganizationConfig> {
        self.organizations.iter().find(|org| org.slug == slug)
    }

    /// Socket address string to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute URL for a path, using `base_url` when configured
    pub fn absolute_uri(&self, path: &str) -> String {
        absolute_uri(self.base_url.as_deref(), path)
    }

    /// Resolved database path
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(PathBuf::from(path));
        }
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        let db_dir = data_dir.join("integration-pipeline");
        std::fs::create_dir_all(&db_dir)?;
        Ok(db_dir.join("integrations.db"))
    }
}
