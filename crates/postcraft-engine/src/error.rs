use postcraft_ai::OrchestratorError;
use postcraft_core::RequestError;
use postcraft_store::StoreError;
use thiserror::Error;

/// Wire-level error codes returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArgument,
    Unauthenticated,
    ResourceExhausted,
    FailedPrecondition,
    Unavailable,
    DeadlineExceeded,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid-argument",
            Self::Unauthenticated => "unauthenticated",
            Self::ResourceExhausted => "resource-exhausted",
            Self::FailedPrecondition => "failed-precondition",
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("quota exhausted: {0}")]
    ResourceExhausted(String),

    #[error("precondition failed: {0}")]
    FailedPrecondition(String),

    #[error("generation unavailable: {0}")]
    Unavailable(String),

    #[error("request did not finish within {0}s")]
    DeadlineExceeded(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Unauthenticated(_) => ErrorCode::Unauthenticated,
            Self::ResourceExhausted(_) => ErrorCode::ResourceExhausted,
            Self::FailedPrecondition(_) => ErrorCode::FailedPrecondition,
            Self::Unavailable(_) => ErrorCode::Unavailable,
            Self::DeadlineExceeded(_) => ErrorCode::DeadlineExceeded,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<RequestError> for PipelineError {
    fn from(e: RequestError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<OrchestratorError> for PipelineError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::ResourceExhausted(msg) => Self::ResourceExhausted(msg),
            OrchestratorError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::QuotaExceeded { .. } => Self::ResourceExhausted(e.to_string()),
            StoreError::NoBonus => Self::FailedPrecondition(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_exhaustion_is_never_internal() {
        let e: PipelineError = OrchestratorError::Unavailable("overloaded".into()).into();
        assert_eq!(e.code(), ErrorCode::Unavailable);
        let e: PipelineError = OrchestratorError::ResourceExhausted("quota".into()).into();
        assert_eq!(e.code().as_str(), "resource-exhausted");
    }

    #[test]
    fn store_quota_errors_map_to_business_codes() {
        let e: PipelineError = StoreError::QuotaExceeded { used: 50, limit: 50 }.into();
        assert_eq!(e.code(), ErrorCode::ResourceExhausted);
        let e: PipelineError = StoreError::NoBonus.into();
        assert_eq!(e.code(), ErrorCode::FailedPrecondition);
        let e: PipelineError = StoreError::Other("disk".into()).into();
        assert_eq!(e.code(), ErrorCode::Internal);
    }
}
