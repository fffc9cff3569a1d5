//! HTTP news search client (Naver search API shape).

use chrono::DateTime;
use serde::Deserialize;
use tracing::info;

use crate::{NewsContext, NewsError, NewsItem};

pub const DEFAULT_NEWS_URL: &str = "https://openapi.naver.com/v1/search/news.json";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsClientConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
}

impl Default for NewsClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NEWS_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

/// News search client.
pub struct NewsClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    originallink: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    pub_date: String,
}

impl From<SearchItem> for NewsItem {
    fn from(item: SearchItem) -> Self {
        let published = DateTime::parse_from_rfc2822(&item.pub_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or(item.pub_date);
        let link = if item.originallink.is_empty() {
            item.link
        } else {
            item.originallink
        };
        NewsItem {
            title: item.title,
            summary: item.description,
            published,
            link,
        }
    }
}

impl NewsClient {
    /// Create a client. `base_url` is the full search endpoint; a trailing
    /// slash is dropped.
    pub fn new(config: NewsClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id,
            client_secret: config.client_secret,
        }
    }
}

#[async_trait::async_trait]
impl NewsContext for NewsClient {
    async fn recent(&self, topic: &str, limit: usize) -> Result<Vec<NewsItem>, NewsError> {
        info!(url = %self.base_url, topic, limit, "searching news");
        let display = limit.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[("query", topic), ("display", display.as_str()), ("sort", "date")])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NewsError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body: SearchResponse = resp.json().await?;
        let items: Vec<NewsItem> = body.items.into_iter().take(limit).map(Into::into).collect();
        info!(count = items.len(), "news search complete");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_item_conversion() {
        let json = r#"{
            "items": [{
                "title": "<b>청년</b> 일자리",
                "originallink": "https://press.example/a",
                "link": "https://news.example/a",
                "description": "요약",
                "pubDate": "Thu, 15 Oct 2026 09:30:00 +0900"
            }, {
                "title": "두 번째",
                "link": "https://news.example/b",
                "pubDate": "어제"
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let items: Vec<NewsItem> = parsed.items.into_iter().map(Into::into).collect();
        assert_eq!(items[0].published, "2026-10-15");
        assert_eq!(items[0].link, "https://press.example/a");
        assert_eq!(items[1].published, "어제");
        assert_eq!(items[1].link, "https://news.example/b");
        assert_eq!(items[1].summary, "");
    }

    #[test]
    fn news_client_trims_trailing_slash() {
        let client = NewsClient::new(NewsClientConfig {
            base_url: "http://localhost:4000/search/".into(),
            ..NewsClientConfig::default()
        });
        assert_eq!(client.base_url, "http://localhost:4000/search");
    }
}
