//! The generative-text seam and failure classification.

use thiserror::Error;

/// A failed generation call, classified by how the caller should react.
///
/// Quota, overload, and timeout failures are transient: the next candidate
/// model may well succeed. `Other` covers everything else (bad request, auth,
/// malformed response) and is not expected to clear up on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("model overloaded: {0}")]
    Overloaded(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Classify a backend failure from its HTTP status (if any) and message.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        match status {
            Some(429) => return Self::QuotaExceeded(message),
            Some(503) | Some(529) => return Self::Overloaded(message),
            Some(408) | Some(504) => return Self::Timeout(message),
            _ => {}
        }

        if has(&["quota", "rate limit", "too many requests", "resource_exhausted"]) {
            Self::QuotaExceeded(message)
        } else if has(&["overloaded", "unavailable"]) {
            Self::Overloaded(message)
        } else if has(&["timeout", "timed out", "deadline"]) {
            Self::Timeout(message)
        } else {
            Self::Other(message)
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuotaExceeded(_) => "quota",
            Self::Overloaded(_) => "overloaded",
            Self::Timeout(_) => "timeout",
            Self::Other(_) => "other",
        }
    }

    /// Whether the failure is transient and worth a backoff before the next candidate.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// A backend that turns a prompt into free-form text using a named model.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_status() {
        assert_eq!(GenerationError::classify(Some(429), "x").kind(), "quota");
        assert_eq!(GenerationError::classify(Some(503), "x").kind(), "overloaded");
        assert_eq!(GenerationError::classify(Some(529), "x").kind(), "overloaded");
        assert_eq!(GenerationError::classify(Some(504), "x").kind(), "timeout");
        assert_eq!(GenerationError::classify(Some(400), "bad request").kind(), "other");
    }

    #[test]
    fn classifies_by_message() {
        let cases = [
            ("Resource has been exhausted (e.g. check quota).", "quota"),
            ("RESOURCE_EXHAUSTED", "quota"),
            ("Too Many Requests", "quota"),
            ("The model is overloaded. Please try again later.", "overloaded"),
            ("Service Unavailable", "overloaded"),
            ("request timed out", "timeout"),
            ("Deadline expired before operation could complete", "timeout"),
            ("API key not valid", "other"),
        ];
        for (msg, kind) in cases {
            assert_eq!(GenerationError::classify(None, msg).kind(), kind, "{msg}");
        }
    }

    #[test]
    fn status_digits_in_the_body_do_not_classify() {
        let err = GenerationError::classify(Some(400), "invalid value 429 at offset 503");
        assert_eq!(err.kind(), "other");
        assert_eq!(GenerationError::classify(None, "request id 5034291 rejected").kind(), "other");
    }

    #[test]
    fn only_other_is_not_retryable() {
        assert!(GenerationError::QuotaExceeded(String::new()).is_retryable());
        assert!(GenerationError::Timeout(String::new()).is_retryable());
        assert!(!GenerationError::Other(String::new()).is_retryable());
    }
}
