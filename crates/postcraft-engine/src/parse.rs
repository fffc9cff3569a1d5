//! Lenient extraction of the `{title, content, wordCount}` object from a model reply.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("fence regex must compile")
});

/// Title and body of one parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDraft {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Slice from the first `{` to the last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Escape raw control characters that appear inside JSON string literals.
///
/// Models often emit literal newlines inside `"content"`, which strict JSON
/// rejects.
fn escape_control_chars(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}

fn decode(candidate: &str) -> Option<CandidateDraft> {
    let reply: Reply = serde_json::from_str(candidate)
        .or_else(|_| serde_json::from_str(&escape_control_chars(candidate)))
        .ok()?;
    if reply.content.trim().is_empty() {
        return None;
    }
    Some(CandidateDraft {
        title: reply.title.trim().to_string(),
        content: reply.content.trim().to_string(),
    })
}

/// Parse a model reply: a fenced code block first, then the outermost
/// brace-delimited span. `None` when nothing decodes to a draft with content.
pub fn parse_reply(raw: &str) -> Option<CandidateDraft> {
    let mut candidates: Vec<&str> = Vec::new();
    if let Some(caps) = FENCED_RE.captures(raw)
        && let Some(body) = caps.get(1)
    {
        candidates.push(body.as_str());
        if let Some(span) = brace_span(body.as_str()) {
            candidates.push(span);
        }
    }
    if let Some(span) = brace_span(raw) {
        candidates.push(span);
    }

    let parsed = candidates.into_iter().find_map(decode);
    if parsed.is_none() {
        debug!(chars = raw.chars().count(), "reply did not contain a draft object");
    }
    parsed
}

/// Stand-in draft used when a reply cannot be parsed.
pub fn placeholder(topic: &str) -> CandidateDraft {
    CandidateDraft {
        title: format!("{topic} 관련 원고"),
        content: format!(
            "<p>{topic}에 대한 의견을 나누고자 합니다.</p>\
             <p>생성된 응답을 해석하지 못해 본문을 완성하지 못했습니다. 다시 시도해 주시기 바랍니다.</p>"
        ),
    }
}
