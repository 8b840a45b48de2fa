//! Provider descriptors - static description of an integration type

use crate::core::{
    integration::{Metadata, PipelineState},
    signature::pipeline_signature,
    step::PipelineStep,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Builds integration metadata from the state accumulated by the pipeline
pub type MetadataBuilder = fn(&PipelineState) -> Metadata;

/// Default metadata builder: stores nothing
pub fn empty_metadata(_state: &PipelineState) -> Metadata {
    Metadata::new()
}

/// Input type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Url,
    Secret,
}

/// One configuration attribute stored per organization per integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigField {
    /// Field name
    pub name: String,

    /// Human-readable label
    pub label: String,

    /// Input type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Placeholder hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Whether the field must be filled in
    #[serde(default)]
    pub required: bool,
}

impl ConfigField {
    pub fn new(name: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            placeholder: None,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }
}

/// Static description of an integration type
///
/// Immutable once registered; the registry hands out shared references for
/// the lifetime of the process.
pub struct ProviderDescriptor {
    /// Unique identifier (e.g. "slack")
    pub id: String,

    /// Human-readable name (e.g. "Slack")
    pub name: String,

    /// Ordered setup steps
    pub steps: Vec<Arc<dyn PipelineStep>>,

    /// Configuration attributes
    pub config_schema: Vec<ConfigField>,

    /// Turns accumulated pipeline state into integration metadata
    pub metadata_builder: MetadataBuilder,
}

impl ProviderDescriptor {
    /// Create a descriptor with no steps and the empty metadata builder
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            steps: Vec::new(),
            config_schema: Vec::new(),
            metadata_builder: empty_metadata,
        }
    }

    /// Append a step to the pipeline
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Append a configuration field
    pub fn with_config_field(mut self, field: ConfigField) -> Self {
        self.config_schema.push(field);
        self
    }

    /// Replace the metadata builder
    pub fn with_metadata_builder(mut self, builder: MetadataBuilder) -> Self {
        self.metadata_builder = builder;
        self
    }

    /// Number of steps in the pipeline
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Signature of the steps currently bound to this descriptor
    pub fn signature(&self) -> String {
        pipeline_signature(&self.steps)
    }

    /// Build integration metadata from pipeline state
    pub fn build_metadata(&self, state: &PipelineState) -> Metadata {
        (self.metadata_builder)(state)
    }

    /// Identities of the bound steps, in order
    pub fn step_identities(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.identity()).collect()
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("steps", &self.step_identities())
            .field("config_schema", &self.config_schema)
            .finish()
    }
}
