//! integration-pipeline - Multi-step setup pipelines for organization integrations

pub mod cli;
pub mod core;
pub mod features;
pub mod persistence;
pub mod pipeline;
pub mod providers;
pub mod session;
pub mod web;

// Re-export commonly used types
pub use core::{
    Integration, Organization, PipelineError, PipelineStep, ProviderDescriptor, ProviderRegistry,
    SetupRequest, StepOutcome,
};
pub use features::{ConfigFeatureGate, FeatureGate};
pub use persistence::{InMemoryIntegrationStore, IntegrationStore};
pub use pipeline::{EntryResponse, PipelineController, PipelineResponse, PipelineServices, SetupEntry};
pub use session::{InMemorySessionStore, SessionHandle, SessionTransport};
