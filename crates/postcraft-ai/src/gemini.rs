//! Gemini `generateContent` backend over HTTP.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::generator::GenerationError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sampling and endpoint settings for the Gemini backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeminiConfig {
    /// Never written back out with the rest of the config.
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

impl GeminiConfig {
    pub fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "topK": self.top_k,
                "topP": self.top_p,
                "maxOutputTokens": self.max_output_tokens,
            }
        })
    }
}

/// Pull the generated text out of a `generateContent` response.
///
/// All text parts of the first candidate are concatenated. A blocked prompt or
/// a candidate with no text is an error.
pub fn extract_text(body: &Value) -> Result<String, GenerationError> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(GenerationError::Other(format!("prompt blocked: {reason}")));
    }
    let candidate = body["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| GenerationError::Other("response has no candidates".to_string()))?;

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
        return Err(GenerationError::Other(format!(
            "candidate has no text (finish reason {reason})"
        )));
    }
    Ok(text)
}

#[cfg(feature = "http")]
pub use client::GeminiClient;

#[cfg(feature = "http")]
mod client {
    use tracing::debug;

    use super::*;
    use crate::generator::TextGenerator;

    pub struct GeminiClient {
        client: reqwest::Client,
        config: GeminiConfig,
    }

    impl GeminiClient {
        pub fn new(mut config: GeminiConfig) -> Self {
            config.base_url = config.base_url.trim_end_matches('/').to_string();
            config.api_key = config.api_key.trim().to_string();
            Self {
                client: reqwest::Client::new(),
                config,
            }
        }

        pub(super) fn endpoint(&self, model: &str) -> String {
            format!("{}/models/{model}:generateContent", self.config.base_url)
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for GeminiClient {
        async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
            let url = self.endpoint(model);
            debug!(url = %url, prompt_chars = prompt.chars().count(), "gemini request");

            let resp = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.config.api_key)
                .json(&self.config.request_body(prompt))
                .send()
                .await
                .map_err(classify_transport)?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GenerationError::classify(
                    Some(status.as_u16()),
                    format!("gemini returned {status}: {body}"),
                ));
            }

            let body: Value = resp.json().await.map_err(classify_transport)?;
            extract_text(&body)
        }
    }

    fn classify_transport(e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(e.to_string())
        } else {
            GenerationError::classify(e.status().map(|s| s.as_u16()), e.to_string())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn endpoint_trims_trailing_slash() {
            let client = GeminiClient::new(GeminiConfig {
                base_url: "http://localhost:8080/v1beta/".into(),
                ..GeminiConfig::default()
            });
            assert_eq!(
                client.endpoint("gemini-1.5-flash"),
                "http://localhost:8080/v1beta/models/gemini-1.5-flash:generateContent"
            );
        }
    }
}
