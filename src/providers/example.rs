//! Example provider, generally used for testing

use crate::core::{
    ConfigField, FieldType, PipelineError, PipelineStep, ProviderDescriptor, RenderedPage,
    SetupRequest, StepOutcome,
};
use crate::pipeline::PipelineController;
use async_trait::async_trait;

pub const EXAMPLE_PROVIDER_ID: &str = "example";

/// Asks for a name and stores it in pipeline state
pub struct ExampleSetupStep;

impl ExampleSetupStep {
    pub const TEMPLATE: &'static str =
        r#"<form method="POST"><input type="text" name="name" /></form>"#;
}

#[async_trait]
impl PipelineStep for ExampleSetupStep {
    fn identity(&self) -> &'static str {
        "integrations.example.ExampleSetupStep"
    }

    async fn advance(
        &self,
        request: &SetupRequest,
        controller: &mut PipelineController,
    ) -> Result<StepOutcome, PipelineError> {
        if let Some(name) = request.form_field("name") {
            controller.bind_state("name", name).await?;
            return Ok(StepOutcome::Continue);
        }

        Ok(StepOutcome::Render(RenderedPage::html(Self::TEMPLATE)))
    }
}

/// Descriptor for the example provider
pub fn example_provider() -> ProviderDescriptor {
    ProviderDescriptor::new(EXAMPLE_PROVIDER_ID, "Example")
        .with_step(ExampleSetupStep)
        .with_config_field(ConfigField::new("name", "Name", FieldType::Text).required())
}
