//! Packaging of the final draft.

use chrono::{DateTime, Utc};
use postcraft_core::text::stripped_char_count;
use postcraft_core::{GeneratedDraft, GenerationRequest};
use uuid::Uuid;

/// A packaged draft plus how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDraft {
    pub draft: GeneratedDraft,
    pub model_used: String,
    pub attempt_count: u32,
}

/// `draft_{unix millis}_{9 random hex chars}`.
pub fn draft_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("draft_{}_{}", now.timestamp_millis(), &suffix[..9])
}

/// Title used when the model gave none.
pub fn fallback_title(topic: &str) -> String {
    format!("{topic} 관련 원고")
}

pub fn assemble(
    request: &GenerationRequest,
    title: &str,
    content: String,
    model_used: String,
    attempt_count: u32,
    now: DateTime<Utc>,
) -> AssembledDraft {
    let title = match title.trim() {
        "" => fallback_title(&request.topic),
        t => t.to_string(),
    };
    AssembledDraft {
        draft: GeneratedDraft {
            id: draft_id(now),
            title,
            word_count: stripped_char_count(&content),
            content,
            category: request.category.clone(),
            sub_category: request.sub_category_str().to_string(),
            keywords: request.keywords_str().to_string(),
            generated_at: now,
        },
        model_used,
        attempt_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_expected_shape() {
        let now = DateTime::from_timestamp_millis(1_760_000_000_123).unwrap();
        let id = draft_id(now);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "draft");
        assert_eq!(parts[1], "1760000000123");
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(draft_id(now), id);
    }

    #[test]
    fn assemble_counts_and_falls_back() {
        let mut request = GenerationRequest::new("청년 일자리 정책", "정책/비전");
        request.keywords = Some("청년, 일자리".into());
        let now = Utc::now();
        let out = assemble(
            &request,
            "  ",
            "<p>가나 다라</p>".into(),
            "gemini-1.5-flash".into(),
            2,
            now,
        );
        assert_eq!(out.draft.title, "청년 일자리 정책 관련 원고");
        assert_eq!(out.draft.word_count, 4);
        assert_eq!(out.draft.keywords, "청년, 일자리");
        assert_eq!(out.draft.sub_category, "");
        assert_eq!(out.draft.generated_at, now);
        assert_eq!(out.attempt_count, 2);
    }
}
