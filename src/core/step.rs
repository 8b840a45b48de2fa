//! Step contract - one page of a multi-page setup workflow

use crate::core::{context::SetupRequest, error::PipelineError};
use crate::pipeline::PipelineController;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A page produced by a step for the client to fill in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// HTTP status code
    pub status: u16,

    /// HTML body
    pub body: String,
}

impl RenderedPage {
    /// A 200 OK HTML page
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// An HTML page with a specific status
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// What a step decided to do with the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Send a page back and wait for the next request
    Render(RenderedPage),
    /// The step is satisfied; move on to the next one
    Continue,
    /// Terminate the attempt with a user-visible message
    Abort(String),
}

/// A single step of a provider's setup pipeline
///
/// Steps may stash data on the controller with `bind_state` but must never
/// touch the integration store; only the controller commits, once the last
/// step has continued.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Fully-qualified identity of the step implementation
    ///
    /// Feeds the pipeline signature, so renaming or moving a step type
    /// invalidates in-flight sessions. The default uses
    /// [`std::any::type_name`], whose output may change between compiler
    /// releases; after a toolchain upgrade in-flight sessions restart from
    /// the first step. Override with a fixed string to keep sessions
    /// valid across upgrades.
    fn identity(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Handle the current request
    async fn advance(
        &self,
        request: &SetupRequest,
        controller: &mut PipelineController,
    ) -> Result<StepOutcome, PipelineError>;
}

impl std::fmt::Debug for dyn PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FirstStep;
    struct SecondStep;

    #[async_trait]
    impl PipelineStep for FirstStep {
        async fn advance(
            &self,
            _request: &SetupRequest,
            _controller: &mut PipelineController,
        ) -> Result<StepOutcome, PipelineError> {
            Ok(StepOutcome::Continue)
        }
    }

    #[async_trait]
    impl PipelineStep for SecondStep {
        fn identity(&self) -> &'static str {
            "custom.SecondStep"
        }

        async fn advance(
            &self,
            _request: &SetupRequest,
            _controller: &mut PipelineController,
        ) -> Result<StepOutcome, PipelineError> {
            Ok(StepOutcome::Render(RenderedPage::html("<p>hi</p>")))
        }
    }

    #[test]
    fn test_default_identity_is_type_path() {
        let step: Box<dyn PipelineStep> = Box::new(FirstStep);
        assert!(step.identity().ends_with("step::tests::FirstStep"));
    }

    #[test]
    fn test_identity_override() {
        let step: Box<dyn PipelineStep> = Box::new(SecondStep);
        assert_eq!(step.identity(), "custom.SecondStep");
        assert_eq!(format!("{:?}", step), "custom.SecondStep");
    }

    #[test]
    fn test_rendered_page_defaults_to_ok() {
        assert_eq!(RenderedPage::html("x").status, 200);
        assert_eq!(RenderedPage::with_status(422, "x").status, 422);
    }
}
