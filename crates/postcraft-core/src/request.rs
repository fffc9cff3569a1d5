//! Validated generation requests.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_WORD_COUNT: u32 = 1700;
pub const TOPIC_MIN_CHARS: usize = 5;
pub const TOPIC_MAX_CHARS: usize = 500;

/// Values that mean "no background given".
const NONE_SENTINELS: &[&str] = &["없음", "none", "n/a"];

fn is_sentinel(item: &str) -> bool {
    let trimmed = item.trim();
    trimmed.is_empty() || NONE_SENTINELS.iter().any(|s| trimmed.eq_ignore_ascii_case(s))
}

/// Free-text background facts, either one block or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Background {
    Text(String),
    List(Vec<String>),
}

impl Default for Background {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl Background {
    /// Items carrying actual content, with sentinels and blanks dropped.
    pub fn items(&self) -> Vec<&str> {
        match self {
            Self::Text(t) if is_sentinel(t) => Vec::new(),
            Self::Text(t) => vec![t.trim()],
            Self::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !is_sentinel(s))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// All items joined by a single space, or `None` when nothing was given.
    pub fn joined(&self) -> Option<String> {
        let items = self.items();
        (!items.is_empty()).then(|| items.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("topic is required")]
    MissingTopic,
    #[error("topic must be {min}-{max} characters, got {actual}")]
    TopicLength { actual: usize, min: usize, max: usize },
    #[error("category is required")]
    MissingCategory,
    #[error("target word count must be positive")]
    ZeroTarget,
}

/// One draft-generation request, already decoded from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub topic: String,
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    /// Comma-separated user keywords, passed through to the draft.
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub background: Background,
    #[serde(default = "default_target")]
    pub target_word_count: u32,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub use_bonus_credit: bool,
}

fn default_target() -> u32 {
    DEFAULT_TARGET_WORD_COUNT
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            category: category.into(),
            sub_category: None,
            keywords: None,
            background: Background::default(),
            target_word_count: DEFAULT_TARGET_WORD_COUNT,
            model_name: None,
            use_bonus_credit: false,
        }
    }

    /// Check bounds and normalize whitespace on topic and category.
    ///
    /// Runs before any external call.
    pub fn validate(mut self) -> Result<Self, RequestError> {
        self.topic = self.topic.trim().to_string();
        self.category = self.category.trim().to_string();

        if self.topic.is_empty() {
            return Err(RequestError::MissingTopic);
        }
        let len = self.topic.chars().count();
        if !(TOPIC_MIN_CHARS..=TOPIC_MAX_CHARS).contains(&len) {
            return Err(RequestError::TopicLength {
                actual: len,
                min: TOPIC_MIN_CHARS,
                max: TOPIC_MAX_CHARS,
            });
        }
        if self.category.is_empty() {
            return Err(RequestError::MissingCategory);
        }
        if self.target_word_count == 0 {
            return Err(RequestError::ZeroTarget);
        }
        self.model_name = self
            .model_name
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        Ok(self)
    }

    pub fn keywords_str(&self) -> &str {
        self.keywords.as_deref().unwrap_or("")
    }

    pub fn sub_category_str(&self) -> &str {
        self.sub_category.as_deref().unwrap_or("")
    }
}
