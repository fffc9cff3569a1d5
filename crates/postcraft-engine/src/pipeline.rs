//! One request through compose, generate, validate, repair, and assemble.

use std::sync::Arc;

use chrono::Utc;
use postcraft_ai::Orchestrator;
use postcraft_core::keywords::extract;
use postcraft_core::text::strip_tags;
use postcraft_core::{GenerationRequest, WriterProfile};
use tracing::{debug, info};

use crate::assembler::{AssembledDraft, assemble};
use crate::composer::PromptContext;
use crate::error::PipelineError;
use crate::machine::{DEFAULT_MAX_ATTEMPTS, DegradedReason, GenerationMachine};
use crate::repair::{PreliminaryStrip, RepairContext, RepairPass, RepairRule};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(AssembledDraft),
    /// Returned anyway: attempts ran out or the reply was unusable.
    Degraded(AssembledDraft, DegradedReason),
}

impl Outcome {
    pub fn draft(&self) -> &AssembledDraft {
        match self {
            Self::Accepted(d) | Self::Degraded(d, _) => d,
        }
    }

    pub fn degraded_reason(&self) -> Option<DegradedReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Degraded(_, reason) => Some(*reason),
        }
    }
}

/// Prompt supplements gathered before generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supplements<'a> {
    pub hints: Option<&'a str>,
    pub news: Option<&'a str>,
}

pub struct Pipeline {
    orchestrator: Arc<Orchestrator>,
    repair: RepairPass,
    max_attempts: u32,
}

impl Pipeline {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            repair: RepairPass::standard(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_repair(mut self, repair: RepairPass) -> Self {
        self.repair = repair;
        self
    }

    pub async fn run(
        &self,
        request: &GenerationRequest,
        profile: &WriterProfile,
        supplements: Supplements<'_>,
    ) -> Result<Outcome, PipelineError> {
        let checklist = extract(&request.background);
        let ctx = PromptContext {
            request,
            profile,
            checklist: &checklist,
            news: supplements.news,
            hints: supplements.hints,
        };

        let outcome = GenerationMachine::new(&self.orchestrator, self.max_attempts)
            .run(&ctx)
            .await?;
        let reason = outcome.degraded_reason();
        let last = outcome.last;

        let repair_ctx = RepairContext::new(profile);
        let content = self.repair.run(&last.draft.content, &repair_ctx);
        let title = if profile.status.suppresses_titles() {
            PreliminaryStrip.apply(&last.draft.title, &repair_ctx)
        } else {
            last.draft.title.clone()
        };

        let plain = strip_tags(&content);
        let missing: Vec<&str> = checklist
            .iter()
            .filter(|k| !plain.contains(k.text.as_str()))
            .map(|k| k.text.as_str())
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "checklist keywords not present in draft");
        }

        let assembled = assemble(
            request,
            &title,
            content,
            last.model,
            outcome.attempts,
            Utc::now(),
        );
        info!(
            id = %assembled.draft.id,
            attempts = assembled.attempt_count,
            model = %assembled.model_used,
            chars = assembled.draft.word_count,
            degraded = ?reason,
            "draft assembled"
        );
        Ok(match reason {
            None => Outcome::Accepted(assembled),
            Some(reason) => Outcome::Degraded(assembled, reason),
        })
    }
}
