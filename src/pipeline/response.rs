//! Outcomes of driving a setup pipeline

use crate::core::{Integration, RenderedPage};

/// What the pipeline produced for the current request
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResponse {
    /// A step rendered a page and is waiting for input
    Page(RenderedPage),

    /// The pipeline finished and the integration was committed
    Completed {
        integration: Integration,
        redirect_to: String,
    },

    /// The attempt was terminated; the session is gone
    Aborted {
        message: String,
        redirect_to: String,
    },
}

impl PipelineResponse {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineResponse::Completed { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, PipelineResponse::Aborted { .. })
    }
}
