//! Core domain models for setup pipelines
//!
//! This module defines providers, steps, the provider registry, and the
//! integration models the pipeline commits to.

pub mod config;
pub mod context;
pub mod error;
pub mod integration;
pub mod provider;
pub mod registry;
pub mod signature;
pub mod step;

pub use context::*;
pub use error::*;
pub use integration::*;
pub use provider::*;
pub use registry::*;
pub use step::*;
