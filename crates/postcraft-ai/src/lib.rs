//! Generative-text layer: the backend seam, the Gemini HTTP backend, and
//! prioritized fallback across model candidates.

pub mod gemini;
pub mod generator;
pub mod orchestrator;

#[cfg(feature = "http")]
pub use gemini::GeminiClient;
pub use gemini::GeminiConfig;
pub use generator::{GenerationError, TextGenerator};
pub use orchestrator::{
    Generation, ModelCandidate, Orchestrator, OrchestratorConfig, OrchestratorError,
};
