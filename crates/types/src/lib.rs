//! Shared type definitions for the Stepcall HTTP step.
//!
//! Every crate in the workspace speaks in terms of these types:
//!
//! - [`StepInput`]: the declarative request descriptor taken from step configuration
//! - [`ResolvedStepInput`]: the literal request produced by input resolution
//! - [`StepResponse`] and [`ResponseBody`]: the normalized result handed back to the workflow
//! - [`RuntimeParams`]: the workflow's runtime parameter mapping

pub mod response;
pub mod step;

pub use response::{ResponseBody, StepResponse};
pub use step::{DEFAULT_ACCEPT, DEFAULT_METHOD, ResolvedStepInput, StepInput};

/// Runtime parameter mapping supplied by the workflow engine.
///
/// Keys are parameter names, values are arbitrary JSON. The mapping is
/// read-only for the HTTP step; the engine owns its lifecycle.
pub type RuntimeParams = serde_json::Map<String, serde_json::Value>;
