//! Finished drafts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A packaged draft. Created once at the end of the pipeline and not mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDraft {
    /// `draft_{millis}_{suffix}`
    pub id: String,
    pub title: String,
    /// `<p>` paragraphs with optional `<strong>` emphasis.
    pub content: String,
    /// Markup- and whitespace-stripped character count of `content`.
    pub word_count: usize,
    pub category: String,
    pub sub_category: String,
    pub keywords: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let draft = GeneratedDraft {
            id: "draft_1_abc".into(),
            title: "제목".into(),
            content: "<p>본문</p>".into(),
            word_count: 2,
            category: "정책/비전".into(),
            sub_category: String::new(),
            keywords: String::new(),
            generated_at: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["wordCount"], 2);
        assert_eq!(v["subCategory"], "");
        assert_eq!(v["generatedAt"], "1970-01-01T00:00:00Z");
    }
}
