//! Integration and organization models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata stored with an installed integration
pub type Metadata = Map<String, Value>;

/// State accumulated by the steps of a setup pipeline
pub type PipelineState = Map<String, Value>;

/// An organization integrations can be attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Numeric organization id
    pub id: u64,

    /// URL slug
    pub slug: String,

    /// Display name
    pub name: String,
}

impl Organization {
    pub fn new(id: u64, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// A successfully configured third-party connection
///
/// Integrations are shared between organizations; the link between the two
/// is kept by the integration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    /// Unique integration id
    pub id: Uuid,

    /// Provider identifier (e.g. "example")
    pub provider: String,

    /// Display name
    pub name: String,

    /// Provider-built metadata
    pub metadata: Metadata,

    /// When the integration was created
    pub date_added: DateTime<Utc>,
}

impl Integration {
    /// Create a new integration record
    ///
    /// The display name is taken from `metadata["name"]` when it is a
    /// string, falling back to `default_name`.
    pub fn new(provider: &str, default_name: &str, metadata: Metadata) -> Self {
        let name = display_name(&metadata, default_name);
        Self {
            id: Uuid::new_v4(),
            provider: provider.to_string(),
            name,
            metadata,
            date_added: Utc::now(),
        }
    }
}

/// Resolve the display name for a metadata mapping
pub fn display_name(metadata: &Metadata, default_name: &str) -> String {
    metadata
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(default_name)
        .to_string()
}
