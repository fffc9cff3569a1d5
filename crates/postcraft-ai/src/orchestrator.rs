//! Prioritized fallback across model candidates.
//!
//! Candidates are tried strictly one after another. Each call races a fixed
//! timeout; a transient failure (quota, overload, timeout) waits a short
//! backoff before the next candidate, any other failure advances at once.
//! When the list runs out, the last failure decides the terminal error.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::generator::{GenerationError, TextGenerator};

/// One backend model in the fallback list. Lower priority is tried first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub name: String,
    pub priority: u32,
}

impl ModelCandidate {
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

/// Default candidate list, in priority order.
pub fn default_candidates() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new("gemini-1.5-flash", 1),
        ModelCandidate::new("gemini-1.5-flash-8b", 2),
        ModelCandidate::new("gemini-1.5-pro", 3),
        ModelCandidate::new("gemini-pro", 4),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrchestratorConfig {
    pub candidates: Vec<ModelCandidate>,
    /// Per-call timeout in seconds.
    pub call_timeout_secs: u64,
    /// Pause between candidates after a transient failure, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            call_timeout_secs: 90,
            backoff_ms: 1000,
        }
    }
}

impl OrchestratorConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// Every candidate failed and the last one was out of quota.
    #[error("all model candidates exhausted; last failure was a quota limit: {0}")]
    ResourceExhausted(String),
    /// Every candidate failed for any other reason.
    #[error("all model candidates unavailable: {0}")]
    Unavailable(String),
}

/// Text produced by the first candidate that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model: String,
}

pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: OrchestratorConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Model names in the order they will be tried.
    ///
    /// A requested model goes first, whether or not it is a configured
    /// candidate; the rest follow by priority.
    pub fn ordered_candidates(&self, requested: Option<&str>) -> Vec<String> {
        let mut sorted: Vec<&ModelCandidate> = self.config.candidates.iter().collect();
        sorted.sort_by_key(|c| c.priority);

        let mut order: Vec<String> = Vec::with_capacity(sorted.len() + 1);
        if let Some(name) = requested {
            order.push(name.to_string());
        }
        for c in sorted {
            if !order.iter().any(|n| n == &c.name) {
                order.push(c.name.clone());
            }
        }
        order
    }

    /// Run the prompt through the candidate list until one succeeds.
    pub async fn generate(
        &self,
        prompt: &str,
        requested: Option<&str>,
    ) -> Result<Generation, OrchestratorError> {
        let order = self.ordered_candidates(requested);
        let timeout = self.config.call_timeout();
        let backoff = self.config.backoff();
        let mut last: Option<GenerationError> = None;

        for (i, model) in order.iter().enumerate() {
            let is_last = i + 1 == order.len();
            info!(model = %model, attempt = i + 1, of = order.len(), "calling model");

            let call = self.generator.generate(model, prompt);
            let result = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(text)) if text.trim().is_empty() => {
                    Err(GenerationError::Other("empty response".to_string()))
                }
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(format!(
                    "no response within {}s",
                    timeout.as_secs_f32()
                ))),
            };

            match result {
                Ok(text) => {
                    info!(model = %model, chars = text.chars().count(), "model responded");
                    return Ok(Generation {
                        text,
                        model: model.clone(),
                    });
                }
                Err(e) => {
                    warn!(model = %model, kind = e.kind(), error = %e, "model call failed");
                    let pause = e.is_retryable() && !is_last && !backoff.is_zero();
                    last = Some(e);
                    if pause {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(match last {
            Some(GenerationError::QuotaExceeded(msg)) => OrchestratorError::ResourceExhausted(msg),
            Some(e) => OrchestratorError::Unavailable(e.to_string()),
            None => OrchestratorError::Unavailable("no model candidates configured".to_string()),
        })
    }
}
