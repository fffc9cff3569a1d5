//! Recent-news context: an optional, best-effort prompt supplement for
//! categories that comment on current events.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{NewsClient, NewsClientConfig};

use postcraft_core::text::{preview, strip_tags};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("{0}")]
    Other(String),
}

/// One news article, reduced to what the prompt needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    /// Publication date as given by the source.
    pub published: String,
    pub link: String,
}

/// Source of recent-news context for a topic.
#[async_trait::async_trait]
pub trait NewsContext: Send + Sync {
    /// Up to `limit` recent articles about `topic`.
    async fn recent(&self, topic: &str, limit: usize) -> Result<Vec<NewsItem>, NewsError>;
}

/// Categories whose drafts comment on current events and benefit from news.
const NEWS_CATEGORIES: &[&str] = &[
    "시사비평",
    "정책제안",
    "정책/비전",
    "의정활동",
    "current-affairs",
    "policy-proposal",
    "activity-report",
];

/// Whether drafts in this category should be given recent-news context.
pub fn should_fetch_news(category: &str) -> bool {
    let category = category.trim();
    NEWS_CATEGORIES
        .iter()
        .any(|c| category == *c || category.starts_with(&format!("{c}/")))
}

/// Longest summary kept per article, in characters.
const SUMMARY_CHARS: usize = 160;

/// Reduce an article to a short plain-text summary: tags stripped, whitespace
/// collapsed, truncated on a character boundary.
pub fn compress(item: &NewsItem) -> NewsItem {
    let squash = |s: &str| strip_tags(s).split_whitespace().collect::<Vec<_>>().join(" ");
    let summary = squash(&item.summary);
    let summary = if summary.chars().count() > SUMMARY_CHARS {
        format!("{}…", preview(&summary, SUMMARY_CHARS))
    } else {
        summary
    };
    NewsItem {
        title: squash(&item.title),
        summary,
        published: item.published.clone(),
        link: item.link.clone(),
    }
}

/// Render articles as a prompt section. Empty input renders nothing.
pub fn format_for_prompt(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = String::from("[최신 뉴스 참고]\n");
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {}", i + 1, item.title));
        if !item.published.is_empty() {
            out.push_str(&format!(" ({})", item.published));
        }
        out.push('\n');
        if !item.summary.is_empty() {
            out.push_str(&format!("   {}\n", item.summary));
        }
    }
    out.push_str("위 뉴스는 배경 이해용이며, 확인되지 않은 내용을 단정하지 마세요.");
    out
}
