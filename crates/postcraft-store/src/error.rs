use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no profile for user {0}")]
    NotFound(String),

    #[error("monthly quota exhausted ({used}/{limit})")]
    QuotaExceeded { used: u32, limit: u32 },

    #[error("no bonus credit available")]
    NoBonus,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
