//! Session record - the only state carried between setup requests

use crate::core::{error::PipelineError, integration::PipelineState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted progress of one setup attempt
///
/// Always written whole; a record that fails to decode or validate is
/// treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// User driving the attempt
    pub user_id: String,

    /// Organization the integration is being attached to
    pub organization_id: u64,

    /// Provider being set up
    pub provider_id: String,

    /// Existing integration being re-authorized, if any
    #[serde(default)]
    pub integration_id: Option<Uuid>,

    /// Signature of the provider's steps when the record was written
    pub signature: String,

    /// Index of the current step (equal to the step count once finished)
    pub step_index: usize,

    /// State bound by steps so far
    #[serde(default)]
    pub state: PipelineState,
}

impl SessionRecord {
    /// Encode the record for the session transport
    pub fn encode(&self) -> Result<Vec<u8>, PipelineError> {
        serde_json::to_vec(self)
            .map_err(|e| PipelineError::Transport(anyhow::Error::new(e).context("Failed to encode session")))
    }

    /// Decode a record read from the session transport
    pub fn decode(bytes: &[u8]) -> Result<Self, PipelineError> {
        serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::InvalidSession(format!("malformed payload: {}", e)))
    }

    /// Check the record against the live pipeline it claims to belong to
    pub fn validate(
        &self,
        user_id: &str,
        organization_id: u64,
        provider_id: &str,
        signature: &str,
        step_count: usize,
    ) -> Result<(), PipelineError> {
        if self.signature != signature {
            return Err(PipelineError::InvalidSession(format!(
                "signature mismatch (stored {}, expected {})",
                self.signature, signature
            )));
        }
        if self.user_id != user_id
            || self.organization_id != organization_id
            || self.provider_id != provider_id
        {
            return Err(PipelineError::InvalidSession(
                "record belongs to a different user, organization, or provider".to_string(),
            ));
        }
        if self.step_index > step_count {
            return Err(PipelineError::InvalidSession(format!(
                "step index {} out of range for {} step(s)",
                self.step_index, step_count
            )));
        }
        Ok(())
    }
}
