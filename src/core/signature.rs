//! Pipeline signatures - integrity hash over a provider's step sequence

use crate::core::step::PipelineStep;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Compute the signature of an ordered list of step identities
///
/// Each identity is length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
pub fn signature_of<'a, I>(identities: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for identity in identities {
        hasher.update((identity.len() as u64).to_be_bytes());
        hasher.update(identity.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Compute the signature of a provider's bound steps
pub fn pipeline_signature(steps: &[Arc<dyn PipelineStep>]) -> String {
    signature_of(steps.iter().map(|step| step.identity()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let a = signature_of(["steps.Install", "steps.Configure"]);
        let b = signature_of(["steps.Install", "steps.Configure"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_signature_changes_on_reorder() {
        let a = signature_of(["steps.Install", "steps.Configure"]);
        let b = signature_of(["steps.Configure", "steps.Install"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_signature_changes_on_add_or_remove() {
        let base = signature_of(["steps.Install", "steps.Configure"]);
        assert_ne!(base, signature_of(["steps.Install"]));
        assert_ne!(
            base,
            signature_of(["steps.Install", "steps.Configure", "steps.Confirm"])
        );
    }

    #[test]
    fn test_signature_is_boundary_safe() {
        assert_ne!(signature_of(["ab", "c"]), signature_of(["a", "bc"]));
    }

    #[test]
    fn test_empty_pipeline_has_signature() {
        let empty = signature_of(Vec::<&str>::new());
        assert_eq!(empty, signature_of(std::iter::empty::<&str>()));
        assert_ne!(empty, signature_of([""]));
    }
}
