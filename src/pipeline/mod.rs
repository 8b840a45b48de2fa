//! Setup pipeline execution

pub mod controller;
pub mod entry;
pub mod response;

pub use controller::{PipelineController, PipelineServices};
pub use entry::{EntryResponse, SetupEntry};
pub use response::PipelineResponse;
