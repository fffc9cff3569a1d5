//! Draft generation engine.
//!
//! A request flows through [`service::GenerationService`]: decode and
//! authenticate, pre-check quota, gather personalization and news context,
//! then [`pipeline::Pipeline`] composes the prompt, runs the bounded
//! generate/validate loop, repairs the result, and assembles the draft.

pub mod assembler;
pub mod composer;
pub mod error;
pub mod gate;
pub mod machine;
pub mod parse;
pub mod personalization;
pub mod pipeline;
pub mod repair;
pub mod service;

pub use assembler::AssembledDraft;
pub use composer::{Feedback, PromptContext, compose};
pub use error::{ErrorCode, PipelineError};
pub use gate::{Check, ValidationResult, validate};
pub use machine::{DegradedReason, GenerationMachine};
pub use pipeline::{Outcome, Pipeline, Supplements};
pub use repair::{RepairContext, RepairPass, RepairRule};
pub use service::{
    AuthError, AuthVerifier, Credential, EngineConfig, GenerationService, RequestEnvelope,
    RequestPayload, ServiceResponse, TokenTable, error_json,
};
