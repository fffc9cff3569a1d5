//! Bounded generate → parse → validate loop.

use postcraft_ai::Orchestrator;
use tracing::{info, warn};

use crate::composer::{Feedback, PromptContext, compose};
use crate::error::PipelineError;
use crate::gate::{Check, ValidationResult, validate};
use crate::parse::{CandidateDraft, parse_reply, placeholder};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// One pass through the loop.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based.
    pub index: u32,
    pub model: String,
    /// False when the reply could not be parsed and the placeholder stood in.
    pub parsed: bool,
    pub draft: CandidateDraft,
    pub validation: ValidationResult,
}

/// Why a draft was returned without passing the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// The last reply had no decodable draft object.
    Unparseable,
    /// Attempts ran out; carries the first failing check of the last attempt.
    ValidationExhausted(Check),
}

impl DegradedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unparseable => "unparseable-reply",
            Self::ValidationExhausted(check) => check.as_str(),
        }
    }
}

impl std::fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MachineOutcome {
    pub last: AttemptRecord,
    pub attempts: u32,
}

impl MachineOutcome {
    /// `None` when the last attempt parsed and passed every check.
    pub fn degraded_reason(&self) -> Option<DegradedReason> {
        if !self.last.parsed {
            return Some(DegradedReason::Unparseable);
        }
        self.last
            .validation
            .first_failure()
            .map(DegradedReason::ValidationExhausted)
    }
}

pub struct GenerationMachine<'a> {
    orchestrator: &'a Orchestrator,
    max_attempts: u32,
}

impl<'a> GenerationMachine<'a> {
    pub fn new(orchestrator: &'a Orchestrator, max_attempts: u32) -> Self {
        Self {
            orchestrator,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run attempts until one passes the gate or the attempt budget is spent.
    ///
    /// Each rejected attempt adds one feedback clause to the next prompt.
    /// Orchestrator failures end the loop immediately.
    pub async fn run(&self, ctx: &PromptContext<'_>) -> Result<MachineOutcome, PipelineError> {
        let target = ctx.request.target_word_count;
        let requested = ctx.request.model_name.as_deref();
        let mut feedback: Vec<Feedback> = Vec::new();
        let mut index = 0;

        loop {
            index += 1;
            let prompt = compose(ctx, &feedback);
            let generation = self.orchestrator.generate(&prompt, requested).await?;

            let (draft, parsed) = match parse_reply(&generation.text) {
                Some(draft) => (draft, true),
                None => {
                    warn!(attempt = index, model = %generation.model, "unparseable reply, using placeholder");
                    (placeholder(&ctx.request.topic), false)
                }
            };
            let validation = validate(&draft.content, ctx.profile, target);
            info!(
                attempt = index,
                model = %generation.model,
                parsed,
                accepted = validation.accepted(),
                length = validation.measured_length,
                required = validation.required_length,
                "attempt validated"
            );

            let record = AttemptRecord {
                index,
                model: generation.model,
                parsed,
                draft,
                validation,
            };
            if record.validation.accepted() || index >= self.max_attempts {
                return Ok(MachineOutcome {
                    last: record,
                    attempts: index,
                });
            }
            if let Some(f) = Feedback::for_rejection(&record.validation, target) {
                feedback.push(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(parsed: bool, validation: ValidationResult) -> MachineOutcome {
        MachineOutcome {
            last: AttemptRecord {
                index: 1,
                model: "m".into(),
                parsed,
                draft: CandidateDraft {
                    title: String::new(),
                    content: String::new(),
                },
                validation,
            },
            attempts: 1,
        }
    }

    fn passing() -> ValidationResult {
        ValidationResult {
            name_present: true,
            region_present: true,
            forbidden_phrase_present: false,
            length_sufficient: true,
            measured_length: 10,
            required_length: 9,
        }
    }

    #[test]
    fn degraded_reason_prefers_unparseable() {
        assert_eq!(record(true, passing()).degraded_reason(), None);
        assert_eq!(
            record(false, passing()).degraded_reason(),
            Some(DegradedReason::Unparseable)
        );
        let short = ValidationResult {
            length_sufficient: false,
            ..passing()
        };
        assert_eq!(
            record(true, short).degraded_reason(),
            Some(DegradedReason::ValidationExhausted(Check::Length))
        );
        assert_eq!(
            DegradedReason::ValidationExhausted(Check::Region).to_string(),
            "region-missing"
        );
    }
}
